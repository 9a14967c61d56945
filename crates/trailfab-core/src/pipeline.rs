//! Generation pipeline: datasets and a track in, layered page geometry out.
//!
//! ```text
//! countries ──┬─> Transformer ──┬─> borders ──> border kerf ──┐
//!             │                 ├─> water ────> water kerf ───┼─> engrave
//!  rivers ────┤                 │                             │
//!  lakes  ────┘   track ────────┴─> trail ────> trail kerf ───┴─> cut
//! ```
//!
//! Everything here is synchronous and single-threaded. Datasets are fully
//! loaded before any geometry work starts, and each stage returns new
//! geometry; nothing is mutated after it is handed on.

use geo::{LineString, Polygon};

use crate::borders::{build_border_kerf, extract_borders};
use crate::config::{Config, drawable_rect, trail_cut_width_mm};
use crate::dataset::{DatasetSource, FeatureCollection, find_country};
use crate::error::Result;
use crate::kernel::Kernel;
use crate::progress::{ProgressObserver, Stage};
use crate::svg::{render_laser_svg, render_plotter_svg};
use crate::trail::{build_trail_kerf, country_inset, extract_trail};
use crate::transform::Transformer;
use crate::water::{build_water_kerf, extract_water};

/// Final page-space geometry, ready for the emitters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    /// Border and water kerfs merged, clipped to the drawable area
    pub engrave: Vec<Polygon<f64>>,
    /// Trail kerf
    pub cut: Vec<Polygon<f64>>,
    /// Border center-lines, for the plotter
    pub border_lines: Vec<LineString<f64>>,
    /// River center-lines, for the plotter
    pub river_lines: Vec<LineString<f64>>,
    /// Lake outlines, for the plotter
    pub lake_polygons: Vec<Polygon<f64>>,
}

/// Rendered documents, present according to the output toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documents {
    pub plotter: Option<String>,
    pub laser: Option<String>,
}

impl Documents {
    /// The document a preview is rendered from: plotter first, laser otherwise.
    pub fn preview_source(&self) -> Option<&str> {
        self.plotter.as_deref().or(self.laser.as_deref())
    }
}

/// Run every stage for `track` (`(lon, lat)` samples).
///
/// The countries dataset and both global water datasets must exist; the
/// regional water datasets are optional.
pub fn generate(
    config: &Config,
    track: &[(f64, f64)],
    source: &dyn DatasetSource,
    observer: &dyn ProgressObserver,
) -> Result<Composition> {
    config.validate()?;
    let ids = &config.datasets;
    let fab = &config.fabrication;
    let drawable = drawable_rect(config);

    // --- Country and projection ---
    let countries = load(source, &ids.countries, observer)?;
    let country = find_country(&countries, &config.country)?;
    let transformer = Transformer::new(&country, &config.page)?;

    // --- Borders ---
    let border_lines = extract_borders(&countries, &config.country, &country, &transformer, observer);

    // --- Water ---
    let rivers = collect_sets(source, &ids.rivers_global, &ids.rivers_regional, observer)?;
    let lakes = collect_sets(source, &ids.lakes_global, &ids.lakes_regional, observer)?;
    let planar = Kernel::planar();
    let country_planar = planar
        .union(country.iter().map(|p| transformer.project_polygon(p)).collect())
        .into_polygons();
    let water = extract_water(&rivers, &lakes, Some(country_planar.as_slice()), &transformer, observer)
        .to_page(&transformer);

    // --- Trail ---
    observer.report(Stage::TrackPoints, "track", track.len());
    let trail_lines: Vec<LineString<f64>> = extract_trail(track, &transformer)
        .iter()
        .map(|l| transformer.line_to_page(l))
        .collect();
    observer.report(Stage::TrailClipped, "trail", trail_lines.len());

    // --- Kerfs ---
    let country_page: Vec<Polygon<f64>> = country
        .iter()
        .map(|p| transformer.geographic_polygon_to_page(p))
        .collect();
    let inset = country_inset(&country_page, fab.laser_border_width_mm / 2.0);
    let cut = build_trail_kerf(
        &trail_lines,
        trail_cut_width_mm(config),
        drawable,
        Some(inset.as_slice()),
        &water.lakes,
    );
    observer.report(Stage::Kerf, "trail", cut.len());

    let border_kerf = build_border_kerf(&border_lines, fab.laser_border_width_mm, drawable);
    observer.report(Stage::Kerf, "borders", border_kerf.len());
    let water_kerf = build_water_kerf(&water, fab, drawable);
    observer.report(Stage::Kerf, "water", water_kerf.len());

    let page = Kernel::page();
    let merged = page.union(border_kerf.into_iter().chain(water_kerf).collect()).into_polygons();
    let engrave = page.clip_polygons_to_rect(&merged, drawable.to_rect()).into_polygons();
    observer.report(Stage::Engrave, "engrave", engrave.len());

    Ok(Composition {
        engrave,
        cut,
        border_lines,
        river_lines: water.rivers,
        lake_polygons: water.lakes,
    })
}

/// Render the documents the config asks for.
pub fn render_documents(composition: &Composition, config: &Config, observer: &dyn ProgressObserver) -> Documents {
    let plotter = config.output_plotter.then(|| render_plotter_svg(composition, config));
    if let Some(svg) = &plotter {
        observer.report(Stage::Document, "plotter", svg.len());
    }
    let laser = config.output_laser.then(|| render_laser_svg(composition, config));
    if let Some(svg) = &laser {
        observer.report(Stage::Document, "laser", svg.len());
    }
    Documents { plotter, laser }
}

/// `<W>x<H>mm`, the size suffix shared by every output file name.
pub fn size_suffix(config: &Config) -> String {
    format!("{}x{}mm", config.page.width_mm, config.page.height_mm)
}

fn load(source: &dyn DatasetSource, id: &str, observer: &dyn ProgressObserver) -> Result<FeatureCollection> {
    let collection = source.fetch(id)?;
    observer.report(Stage::DatasetLoaded, id, collection.len());
    Ok(collection)
}

/// A required global dataset plus an optional regional one.
fn collect_sets(
    source: &dyn DatasetSource,
    global: &str,
    regional: &str,
    observer: &dyn ProgressObserver,
) -> Result<Vec<FeatureCollection>> {
    let mut sets = vec![load(source, global, observer)?];
    if let Some(extra) = source.fetch_optional(regional)? {
        observer.report(Stage::DatasetLoaded, regional, extra.len());
        sets.push(extra);
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Feature, MemorySource};
    use crate::error::TrailfabError;
    use crate::geometry::Shape;
    use crate::progress::NullObserver;
    use crate::progress::testing::RecordingObserver;
    use geo::{line_string, polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    fn source() -> MemorySource {
        let ids = Config::default().datasets;
        MemorySource::new()
            .with(
                &ids.countries,
                FeatureCollection::new(vec![
                    Feature::new(Some("Hungary"), Shape::Polygon(rect(16.0, 45.7, 22.9, 48.6))),
                ]),
            )
            .with(
                &ids.rivers_global,
                FeatureCollection::new(vec![Feature::new(
                    Some("Danube"),
                    Shape::Line(line_string![(x: 18.9, y: 48.3), (x: 18.9, y: 46.0)]),
                )]),
            )
            .with(&ids.lakes_global, FeatureCollection::default())
    }

    fn track() -> Vec<(f64, f64)> {
        vec![(16.5, 47.0), (18.0, 47.5), (20.0, 47.2), (22.0, 48.0)]
    }

    #[test]
    fn composition_has_every_layer() {
        let obs = RecordingObserver::default();
        let comp = generate(&Config::default(), &track(), &source(), &obs).unwrap();
        assert!(!comp.engrave.is_empty());
        assert!(!comp.cut.is_empty());
        assert!(!comp.border_lines.is_empty());
        assert_eq!(comp.river_lines.len(), 1);
        assert!(comp.lake_polygons.is_empty());
        assert_eq!(obs.count_for(Stage::TrackPoints), Some(4));
    }

    #[test]
    fn missing_regional_datasets_are_tolerated() {
        // `source()` has no regional datasets at all
        assert!(generate(&Config::default(), &track(), &source(), &NullObserver).is_ok());
    }

    #[test]
    fn missing_global_dataset_is_fatal() {
        let ids = Config::default().datasets;
        let src = MemorySource::new()
            .with(&ids.countries, FeatureCollection::new(vec![
                Feature::new(Some("Hungary"), Shape::Polygon(rect(16.0, 45.7, 22.9, 48.6))),
            ]))
            .with(&ids.lakes_global, FeatureCollection::default());
        let err = generate(&Config::default(), &track(), &src, &NullObserver).unwrap_err();
        assert!(matches!(err, TrailfabError::Dataset { .. }));
    }

    #[test]
    fn unknown_country_is_fatal() {
        let mut config = Config::default();
        config.country = "Atlantis".to_string();
        let err = generate(&config, &track(), &source(), &NullObserver).unwrap_err();
        assert!(matches!(err, TrailfabError::CountryNotFound(ref name) if name == "Atlantis"));
    }

    #[test]
    fn invalid_config_is_rejected_first() {
        let mut config = Config::default();
        config.page.width_mm = 0.0;
        let err = generate(&config, &track(), &MemorySource::new(), &NullObserver).unwrap_err();
        assert!(matches!(err, TrailfabError::InvalidConfig(_)));
    }

    #[test]
    fn documents_follow_toggles() {
        let config = Config { output_plotter: false, ..Config::default() };
        let comp = generate(&config, &track(), &source(), &NullObserver).unwrap();
        let docs = render_documents(&comp, &config, &NullObserver);
        assert!(docs.plotter.is_none());
        assert!(docs.laser.is_some());
        assert_eq!(docs.preview_source(), docs.laser.as_deref());
    }

    #[test]
    fn size_suffix_uses_page_size() {
        assert_eq!(size_suffix(&Config::default()), "210x148mm");
    }
}
