//! SVG document emitters.
//!
//! Two documents come out of a [`Composition`]:
//!
//! - the **plotter** document: stroked center-lines and hatching, one layer
//!   per pen (`1-borders`, `2-water`, `3-trail`, `4-text`)
//! - the **laser** document: hairline cuts (`1-Trail`, `2-Contour`,
//!   `3-Stitch`) and even-odd filled engraving (`4-Engrave`)
//!
//! Both are sized in millimeters with a 96 DPI user-unit viewBox, and every
//! layer is an Inkscape layer group so plotter and laser software pick the
//! layers up by name.
//!
//! Output is built with plain string formatting. Coordinates are rounded to
//! 4 decimals before formatting, so the same composition always produces the
//! same bytes.

use std::fmt::Write as _;

use geo::{Coord, LineString, Polygon};

use crate::config::{Config, Edge, drawable_rect, mm_to_px, resolve_stitch_edge};
use crate::font::StrokeFont;
use crate::geometry::round_to;
use crate::hatch::generate_hatch_lines;
use crate::kernel::Kernel;
use crate::pipeline::Composition;

const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
const PLOTTER_INK: &str = "#000000";

// ============================================================================
// DOCUMENT BUILDER
// ============================================================================

/// Accumulates one SVG document.
///
/// ## Rust Lesson #25: `fmt::Write` for Strings
///
/// `String` implements `std::fmt::Write`, so `write!(s, ...)` appends
/// formatted text without allocating a temporary like `push_str(&format!(..))`
/// does. Writing to a `String` cannot fail, which is why the results below
/// are discarded with `let _ =`.
struct SvgDocument {
    out: String,
}

impl SvgDocument {
    fn new(config: &Config) -> Self {
        let (w, h) = (config.page.width_mm, config.page.height_mm);
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<?xml version="1.0" encoding="utf-8" ?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="{}" width="{}mm" height="{}mm" viewBox="0 0 {} {}">
"#,
            INKSCAPE_NS,
            w,
            h,
            round_to(mm_to_px(w), 2),
            round_to(mm_to_px(h), 2),
        );
        Self { out }
    }

    fn begin_layer(&mut self, id: &str, label: &str) {
        let _ = writeln!(
            self.out,
            r#"  <g id="{}" inkscape:label="{}" inkscape:groupmode="layer">"#,
            id, label
        );
    }

    fn end_layer(&mut self) {
        self.out.push_str("  </g>\n");
    }

    /// Open stroke through page-space points.
    fn polyline(&mut self, line: &LineString<f64>, stroke: &str, width_mm: f64) {
        if line.0.len() < 2 {
            return;
        }
        let points: Vec<String> = line
            .0
            .iter()
            .map(|c| format!("{},{}", mm_to_px(c.x), mm_to_px(c.y)))
            .collect();
        let _ = writeln!(
            self.out,
            r#"    <polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round" />"#,
            points.join(" "),
            stroke,
            mm_to_px(width_mm)
        );
    }

    /// Stroked outline of one closed ring.
    fn ring_outline(&mut self, ring: &LineString<f64>, stroke: &str, width_mm: f64) {
        if ring.0.len() < 2 {
            return;
        }
        let _ = writeln!(
            self.out,
            r#"    <path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round" />"#,
            ring_path(&ring.0),
            stroke,
            mm_to_px(width_mm)
        );
    }

    /// Outlines of a polygon's exterior and every hole.
    fn polygon_outline(&mut self, polygon: &Polygon<f64>, stroke: &str, width_mm: f64) {
        self.ring_outline(polygon.exterior(), stroke, width_mm);
        for hole in polygon.interiors() {
            self.ring_outline(hole, stroke, width_mm);
        }
    }

    /// Solid polygon; holes punch through with the even-odd rule.
    fn filled_polygon(&mut self, polygon: &Polygon<f64>, fill: &str) {
        if polygon.exterior().0.len() < 2 {
            return;
        }
        let mut d = ring_path(&polygon.exterior().0);
        for hole in polygon.interiors().iter().filter(|h| h.0.len() >= 2) {
            d.push(' ');
            d.push_str(&ring_path(&hole.0));
        }
        let _ = writeln!(
            self.out,
            r#"    <path d="{}" fill="{}" stroke="none" fill-rule="evenodd" />"#,
            d, fill
        );
    }

    fn circle(&mut self, center: Coord<f64>, radius_mm: f64, stroke: &str, width_mm: f64) {
        let _ = writeln!(
            self.out,
            r#"    <circle cx="{}" cy="{}" r="{}" fill="none" stroke="{}" stroke-width="{}" />"#,
            mm_to_px(center.x),
            mm_to_px(center.y),
            mm_to_px(radius_mm),
            stroke,
            mm_to_px(width_mm)
        );
    }

    fn finish(mut self) -> String {
        self.out.push_str("</svg>\n");
        self.out
    }
}

/// `M x,y L x,y ... Z` for one ring, in user units.
fn ring_path(coords: &[Coord<f64>]) -> String {
    let mut d = String::new();
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{}{},{}", if i == 0 { 'M' } else { 'L' }, mm_to_px(c.x), mm_to_px(c.y));
    }
    d.push_str(" Z");
    d
}

// ============================================================================
// PLOTTER
// ============================================================================

/// Render the pen-plotter document.
pub fn render_plotter_svg(composition: &Composition, config: &Config) -> String {
    let fab = &config.fabrication;
    let trail_stroke = config.trail.stroke_mm;
    let mut doc = SvgDocument::new(config);

    doc.begin_layer("borders", "1-borders");
    for line in &composition.border_lines {
        doc.polyline(line, PLOTTER_INK, fab.border_stroke_mm);
    }
    doc.end_layer();

    doc.begin_layer("water", "2-water");
    for line in &composition.river_lines {
        doc.polyline(line, PLOTTER_INK, fab.water_stroke_mm);
    }
    for lake in &composition.lake_polygons {
        doc.polygon_outline(lake, PLOTTER_INK, fab.water_stroke_mm);
        for hatch in generate_hatch_lines(lake, fab.hatch_spacing_mm, fab.hatch_angle_deg) {
            doc.polyline(&hatch, PLOTTER_INK, fab.water_stroke_mm);
        }
    }
    doc.end_layer();

    doc.begin_layer("trail", "3-trail");
    for poly in &composition.cut {
        doc.polygon_outline(poly, PLOTTER_INK, trail_stroke);
        for hatch in generate_hatch_lines(poly, fab.hatch_spacing_mm, fab.hatch_angle_deg) {
            doc.polyline(&hatch, PLOTTER_INK, trail_stroke);
        }
    }
    doc.end_layer();

    let caption = caption_lines(config);
    if !caption.is_empty() {
        doc.begin_layer("text", "4-text");
        for line in &caption {
            doc.polyline(line, PLOTTER_INK, config.caption.stroke_mm);
        }
        doc.end_layer();
    }

    doc.finish()
}

// ============================================================================
// LASER
// ============================================================================

/// Render the laser cut/engrave document.
pub fn render_laser_svg(composition: &Composition, config: &Config) -> String {
    let fab = &config.fabrication;
    let cut = fab.laser_cut_color.as_str();
    let hairline = fab.laser_hairline_mm;
    let mut doc = SvgDocument::new(config);

    doc.begin_layer("trail", "1-Trail");
    for poly in &composition.cut {
        doc.polygon_outline(poly, cut, hairline);
    }
    doc.end_layer();

    doc.begin_layer("contour", "2-Contour");
    let (w, h) = (config.page.width_mm, config.page.height_mm);
    let page = LineString::from(vec![(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]);
    doc.ring_outline(&page, cut, hairline);
    doc.end_layer();

    if config.stitch.enabled {
        doc.begin_layer("stitch", "3-Stitch");
        let radius = config.stitch.hole_diameter_mm / 2.0;
        for center in stitch_holes(config) {
            doc.circle(center, radius, cut, hairline);
        }
        doc.end_layer();
    }

    doc.begin_layer("engrave", "4-Engrave");
    for poly in &composition.engrave {
        doc.filled_polygon(poly, &fab.laser_engrave_color);
    }
    let caption = caption_lines(config);
    let strokes = Kernel::page().buffer_lines(&caption, config.caption.stroke_mm / 2.0);
    for poly in strokes.into_polygons() {
        doc.filled_polygon(&poly, &fab.laser_engrave_color);
    }
    doc.end_layer();

    doc.finish()
}

/// Title and subtitle as single-stroke polylines, right-aligned to the
/// drawable area. Empty when neither is set.
fn caption_lines(config: &Config) -> Vec<LineString<f64>> {
    let caption = &config.caption;
    let font = StrokeFont::builtin();
    let right = drawable_rect(config).x_max;
    let mut lines = font.layout_right(&caption.title, right, caption.title_y_mm, caption.title_size_mm);
    lines.extend(font.layout_right(&caption.subtitle, right, caption.subtitle_y_mm, caption.subtitle_size_mm));
    lines
}

/// Stitch hole centers in page millimeters.
///
/// Holes are spread evenly from `edge_inset_mm` to the far inset along the
/// resolved edge, `offset_mm` in from it. A single hole sits at the middle
/// of that span.
pub fn stitch_holes(config: &Config) -> Vec<Coord<f64>> {
    let stitch = &config.stitch;
    let (w, h) = (config.page.width_mm, config.page.height_mm);
    let edge = resolve_stitch_edge(config);

    let span_end = match edge {
        Edge::Top | Edge::Bottom => w - stitch.edge_inset_mm,
        Edge::Left | Edge::Right => h - stitch.edge_inset_mm,
    };
    let fixed = match edge {
        Edge::Top | Edge::Left => stitch.offset_mm,
        Edge::Bottom => h - stitch.offset_mm,
        Edge::Right => w - stitch.offset_mm,
    };
    let along = spread(stitch.edge_inset_mm, span_end, stitch.hole_count);

    along
        .into_iter()
        .map(|t| match edge {
            Edge::Top | Edge::Bottom => Coord { x: t, y: fixed },
            Edge::Left | Edge::Right => Coord { x: fixed, y: t },
        })
        .collect()
}

/// `count` evenly spaced positions from `start` to `end` inclusive.
fn spread(start: f64, end: f64, count: u32) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![(start + end) / 2.0],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageConfig, StitchConfig, StitchEdge};
    use geo::{line_string, polygon};

    fn composition() -> Composition {
        Composition {
            engrave: vec![polygon![
                exterior: [(x: 20.0, y: 20.0), (x: 40.0, y: 20.0), (x: 40.0, y: 40.0), (x: 20.0, y: 40.0)],
                interiors: [[(x: 25.0, y: 25.0), (x: 30.0, y: 25.0), (x: 30.0, y: 30.0), (x: 25.0, y: 30.0)]]
            ]],
            cut: vec![polygon![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0), (x: 60.0, y: 52.0), (x: 50.0, y: 52.0)]],
            border_lines: vec![line_string![(x: 20.0, y: 20.0), (x: 100.0, y: 20.0)]],
            river_lines: vec![line_string![(x: 30.0, y: 60.0), (x: 80.0, y: 70.0)]],
            lake_polygons: vec![polygon![(x: 100.0, y: 80.0), (x: 110.0, y: 80.0), (x: 110.0, y: 90.0), (x: 100.0, y: 90.0)]],
        }
    }

    fn layer_labels(svg: &str) -> Vec<&str> {
        svg.split("inkscape:label=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect()
    }

    #[test]
    fn document_is_sized_in_millimeters() {
        let svg = render_laser_svg(&composition(), &Config::default());
        assert!(svg.contains(r#"width="210mm" height="148mm""#));
        assert!(svg.contains(r#"viewBox="0 0 793.7 559.37""#), "{}", &svg[..300]);
        assert!(svg.contains(INKSCAPE_NS));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn plotter_layers_in_order() {
        let mut config = Config::default();
        let svg = render_plotter_svg(&composition(), &config);
        assert_eq!(layer_labels(&svg), vec!["1-borders", "2-water", "3-trail"], "no caption, no text layer");

        config.caption.title = "Blue Trail".to_string();
        let svg = render_plotter_svg(&composition(), &config);
        assert_eq!(layer_labels(&svg), vec!["1-borders", "2-water", "3-trail", "4-text"]);
        let text = svg.split("4-text").nth(1).unwrap();
        assert!(text.matches("<polyline").count() > 10, "one polyline per glyph stroke");
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn plotter_hatches_lakes_and_trail() {
        let svg = render_plotter_svg(&composition(), &Config::default());
        let water = svg.split("2-water").nth(1).and_then(|s| s.split("</g>").next()).unwrap();
        assert!(water.matches("<polyline").count() > 1, "river plus lake hatching");
        assert_eq!(water.matches("<path").count(), 1, "one lake outline");

        let trail = svg.split("3-trail").nth(1).and_then(|s| s.split("</g>").next()).unwrap();
        assert!(trail.contains("<path"));
        assert!(trail.contains("<polyline"), "trail kerf is hatched for the plotter");
    }

    #[test]
    fn laser_layers_and_styles() {
        let svg = render_laser_svg(&composition(), &Config::default());
        assert_eq!(layer_labels(&svg), vec!["1-Trail", "2-Contour", "3-Stitch", "4-Engrave"]);
        assert_eq!(svg.matches("<circle").count(), 5);
        assert!(svg.contains(r##"fill="#000000" stroke="none" fill-rule="evenodd""##));
        assert!(svg.contains("M0,0 L793.7008,0 L793.7008,559.3701 L0,559.3701 Z"));

        let engrave = svg.split("4-Engrave").nth(1).unwrap();
        assert_eq!(engrave.matches(" Z").count(), 2, "hole in the same path");
    }

    #[test]
    fn stitch_layer_can_be_disabled() {
        let mut config = Config::default();
        config.stitch.enabled = false;
        let svg = render_laser_svg(&composition(), &config);
        assert!(!svg.contains("3-Stitch"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn laser_caption_is_engraved_strokes() {
        let mut config = Config::default();
        let bare = render_laser_svg(&composition(), &config);
        let bare_fills = bare.matches("fill-rule").count();

        config.caption.subtitle = "Kéktúra <1> & more".to_string();
        let svg = render_laser_svg(&composition(), &config);
        assert!(!svg.contains("<text"));
        assert!(!svg.contains("Kéktúra"));
        assert!(svg.matches("fill-rule").count() > bare_fills + 10, "buffered glyph strokes");

        let right = mm_to_px(drawable_rect(&config).x_max);
        let engrave = svg.split("4-Engrave").nth(1).unwrap();
        let max_x = engrave
            .split(['M', 'L'])
            .skip(1)
            .filter_map(|p| p.split(',').next()?.trim().parse::<f64>().ok())
            .fold(f64::MIN, f64::max);
        assert!(max_x <= right, "caption ends inside the drawable area: {} > {}", max_x, right);
    }

    #[test]
    fn stitch_holes_along_top() {
        let holes = stitch_holes(&Config::default());
        let xs: Vec<f64> = holes.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![10.0, 57.5, 105.0, 152.5, 200.0]);
        assert!(holes.iter().all(|c| c.y == 10.0));
    }

    #[test]
    fn stitch_holes_on_portrait_long_edge() {
        let config = Config {
            page: PageConfig { width_mm: 148.0, height_mm: 210.0, padding_mm: 15.0 },
            stitch: StitchConfig { hole_count: 3, ..StitchConfig::default() },
            ..Config::default()
        };
        let holes = stitch_holes(&config);
        assert_eq!(holes, vec![
            Coord { x: 10.0, y: 10.0 },
            Coord { x: 10.0, y: 105.0 },
            Coord { x: 10.0, y: 200.0 },
        ]);
    }

    #[test]
    fn stitch_holes_on_far_edges() {
        let mut config = Config::default();
        config.stitch.edge = StitchEdge::Bottom;
        assert!(stitch_holes(&config).iter().all(|c| c.y == 138.0));
        config.stitch.edge = StitchEdge::Right;
        assert!(stitch_holes(&config).iter().all(|c| c.x == 200.0));
    }

    #[test]
    fn single_stitch_hole_is_centered() {
        let mut config = Config::default();
        config.stitch.hole_count = 1;
        assert_eq!(stitch_holes(&config), vec![Coord { x: 105.0, y: 10.0 }]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let config = Config::default();
        assert_eq!(render_plotter_svg(&composition(), &config), render_plotter_svg(&composition(), &config));
        assert_eq!(render_laser_svg(&composition(), &config), render_laser_svg(&composition(), &config));
    }
}
