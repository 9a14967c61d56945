//! End-to-end pipeline tests over a small synthetic world.
//!
//! The world is a rectangular target country with two neighbors sharing
//! its edges vertex for vertex, one river crossing it, one stray river, and
//! a lake inside the target.

use std::cell::RefCell;

use geo::{Contains, LineString, Point, Polygon, line_string, polygon};

use trailfab_core::{
    Composition, Config, Feature, FeatureCollection, MemorySource, NullObserver, ProgressObserver, Shape, Stage,
    TrailfabError, drawable_rect, generate, render_documents,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn countries() -> FeatureCollection {
    FeatureCollection::new(vec![
        Feature::new(Some("Midland"), Shape::Polygon(rect(18.0, 46.0, 21.0, 48.0))).with_admin("Republic of Midland"),
        Feature::new(
            Some("Eastland"),
            Shape::Polygon(polygon![
                (x: 21.0, y: 45.0), (x: 24.0, y: 45.0), (x: 24.0, y: 49.0), (x: 21.0, y: 49.0),
                (x: 21.0, y: 48.0), (x: 21.0, y: 46.0),
            ]),
        ),
        Feature::new(
            Some("Northland"),
            Shape::Polygon(polygon![
                (x: 17.0, y: 48.0), (x: 18.0, y: 48.0), (x: 21.0, y: 48.0), (x: 21.0, y: 50.0), (x: 17.0, y: 50.0),
            ]),
        ),
        Feature::new(Some("Farland"), Shape::Polygon(rect(100.0, 10.0, 101.0, 11.0))),
    ])
}

fn rivers() -> FeatureCollection {
    FeatureCollection::new(vec![
        Feature::new(Some("Great"), Shape::Line(line_string![(x: 19.0, y: 48.4), (x: 19.2, y: 47.0), (x: 19.0, y: 45.8)])),
        Feature::new(Some("Stray"), Shape::Line(line_string![(x: 17.3, y: 45.6), (x: 17.4, y: 45.7)])),
    ])
}

fn lakes() -> FeatureCollection {
    FeatureCollection::new(vec![Feature::new(Some("Still"), Shape::Polygon(rect(19.8, 46.8, 20.2, 47.0)))])
}

fn source() -> MemorySource {
    let ids = Config::default().datasets;
    MemorySource::new()
        .with(&ids.countries, countries())
        .with(&ids.rivers_global, rivers())
        .with(&ids.rivers_regional, rivers())
        .with(&ids.lakes_global, lakes())
}

fn config() -> Config {
    Config {
        country: "Midland".to_string(),
        ..Config::default()
    }
}

fn track() -> Vec<(f64, f64)> {
    vec![(18.3, 46.3), (19.0, 46.9), (20.0, 46.9), (20.5, 47.5), (20.8, 47.8)]
}

fn run(config: &Config, track: &[(f64, f64)]) -> Composition {
    generate(config, track, &source(), &NullObserver).unwrap()
}

fn all_coords(comp: &Composition) -> Vec<(f64, f64)> {
    let rings = |p: &Polygon<f64>| -> Vec<LineString<f64>> {
        std::iter::once(p.exterior().clone()).chain(p.interiors().iter().cloned()).collect()
    };
    comp.engrave
        .iter()
        .chain(comp.cut.iter())
        .flat_map(rings)
        .flat_map(|ring| ring.0.into_iter().map(|c| (c.x, c.y)))
        .collect()
}

/// Remembers the kerf polygon count reported for each layer.
#[derive(Default)]
struct KerfCounts(RefCell<Vec<(String, usize)>>);

impl ProgressObserver for KerfCounts {
    fn report(&self, stage: Stage, subject: &str, count: usize) {
        if stage == Stage::Kerf {
            self.0.borrow_mut().push((subject.to_string(), count));
        }
    }
}

impl KerfCounts {
    fn get(&self, layer: &str) -> Option<usize> {
        self.0.borrow().iter().find(|(s, _)| s == layer).map(|(_, n)| *n)
    }
}

/// Midpoint of a line's middle segment, away from where clipping cut it.
fn middle(line: &LineString<f64>) -> Point<f64> {
    let i = (line.0.len() - 1) / 2;
    let (a, b) = (line.0[i], line.0[i + 1]);
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[test]
fn every_kerf_is_built_inside_the_drawable_area() {
    let cfg = config();
    let kerfs = KerfCounts::default();
    let comp = generate(&cfg, &track(), &source(), &kerfs).unwrap();

    for layer in ["trail", "borders", "water"] {
        assert!(kerfs.get(layer).is_some_and(|n| n > 0), "no {} kerf", layer);
    }
    assert!(!comp.cut.is_empty());
    assert!(!comp.engrave.is_empty());

    // Center-lines run down the middle of their engraved kerf.
    assert!(!comp.border_lines.is_empty());
    for line in comp.border_lines.iter().chain(comp.river_lines.iter()) {
        let p = middle(line);
        assert!(comp.engrave.iter().any(|poly| poly.contains(&p)), "{:?} is not engraved", p);
    }

    let d = drawable_rect(&cfg);
    for (x, y) in all_coords(&comp) {
        assert!(d.contains(x, y, 1e-3), "({}, {}) outside the drawable area", x, y);
    }
}

#[test]
fn rerun_is_byte_identical() {
    let cfg = config();
    let first = run(&cfg, &track());
    let second = run(&cfg, &track());
    assert_eq!(first, second);

    let a = render_documents(&first, &cfg, &NullObserver);
    let b = render_documents(&second, &cfg, &NullObserver);
    assert_eq!(a.plotter, b.plotter);
    assert_eq!(a.laser, b.laser);
    assert!(a.plotter.is_some() && a.laser.is_some());
}

#[test]
fn kerfs_stay_inside_padding() {
    for (w, h, pad) in [(210.0, 148.0, 15.0), (148.0, 210.0, 10.0), (300.0, 300.0, 25.0)] {
        let mut cfg = config();
        cfg.page.width_mm = w;
        cfg.page.height_mm = h;
        cfg.page.padding_mm = pad;
        let comp = run(&cfg, &track());
        assert!(!comp.engrave.is_empty());
        for (x, y) in all_coords(&comp) {
            assert!(x >= pad - 1e-3 && x <= w - pad + 1e-3, "x {} outside on {}x{}", x, w, h);
            assert!(y >= pad - 1e-3 && y <= h - pad + 1e-3, "y {} outside on {}x{}", y, w, h);
        }
    }
}

#[test]
fn missing_country_fails_without_output() {
    let mut cfg = config();
    cfg.country = "Nowhere".to_string();
    match generate(&cfg, &track(), &source(), &NullObserver) {
        Err(TrailfabError::CountryNotFound(name)) => assert_eq!(name, "Nowhere"),
        other => panic!("expected CountryNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn country_matches_admin_name() {
    let mut cfg = config();
    cfg.country = "Republic of Midland".to_string();
    assert!(generate(&cfg, &track(), &source(), &NullObserver).is_ok());
}

#[test]
fn empty_track_gives_empty_cut() {
    let cfg = config();
    let comp = run(&cfg, &[]);
    assert!(comp.cut.is_empty());
    assert!(!comp.engrave.is_empty(), "borders and water are still engraved");

    let single = run(&cfg, &[(19.0, 47.0)]);
    assert!(single.cut.is_empty());
}

#[test]
fn stray_river_is_dropped_and_duplicates_collapse() {
    let comp = run(&config(), &track());
    // "Great" appears in both river datasets and is split by nothing; the
    // lake does not touch it. "Stray" never reaches Midland.
    assert_eq!(comp.river_lines.len(), 1, "{:?}", comp.river_lines);
    assert_eq!(comp.lake_polygons.len(), 1);
}

#[test]
fn trail_avoids_the_lake() {
    let comp = run(&config(), &track());
    assert!(!comp.cut.is_empty());
    let lake = &comp.lake_polygons[0];
    let lake_box = geo::BoundingRect::bounding_rect(lake).unwrap();
    for poly in &comp.cut {
        for c in &poly.exterior().0 {
            let inside = c.x > lake_box.min().x + 1e-3
                && c.x < lake_box.max().x - 1e-3
                && c.y > lake_box.min().y + 1e-3
                && c.y < lake_box.max().y - 1e-3;
            assert!(!inside, "cut vertex ({}, {}) inside the lake", c.x, c.y);
        }
    }
}

#[test]
fn laser_document_has_all_layers() {
    let cfg = config();
    let docs = render_documents(&run(&cfg, &track()), &cfg, &NullObserver);
    let laser = docs.laser.unwrap();
    for label in ["1-Trail", "2-Contour", "3-Stitch", "4-Engrave"] {
        assert!(laser.contains(label), "missing {}", label);
    }
    let plotter = docs.plotter.unwrap();
    for label in ["1-borders", "2-water", "3-trail"] {
        assert!(plotter.contains(label), "missing {}", label);
    }
}
