//! Border layer: the target country's outline plus its neighbors' borders.
//!
//! Pipeline (planar meters until the last step):
//!
//! 1. find neighbors within 1 degree of the target's bounding box
//! 2. project each country's exterior rings and clip them to the drawable box
//! 3. for neighbors, merge touching pieces and keep only the longest
//! 4. collapse shared borders (each appears once per country) and re-merge
//! 5. drop fragments not connected to the target's own border
//! 6. move to page space
//!
//! [`build_border_kerf`] then fattens the page-space lines into laser
//! engrave polygons.

use geo::{BoundingRect, LineString, MultiPolygon, Polygon, Rect, coord};

use crate::config::DrawableRect;
use crate::connectivity::retain_connected;
use crate::dataset::{FeatureCollection, find_neighbors};
use crate::geometry::line_length;
use crate::kernel::Kernel;
use crate::progress::{ProgressObserver, Stage};
use crate::transform::Transformer;

/// Neighbor search margin around the target's bounding box, degrees.
pub const NEIGHBOR_MARGIN_DEG: f64 = 1.0;

/// Connectivity tolerance for orphan removal, planar meters.
pub const ORPHAN_TOLERANCE_M: f64 = 500.0;

/// Project polygon exterior rings to planar space and clip them to `clip_box`.
///
/// With `keep_longest`, pieces are merged where they touch and only the
/// longest merged line survives (when there was more than one piece). That
/// strips a neighbor down to the stretch that actually faces the target.
pub fn project_and_clip_border(
    polygons: &[Polygon<f64>],
    transformer: &Transformer,
    clip_box: Rect<f64>,
    keep_longest: bool,
    kernel: &Kernel,
) -> Vec<LineString<f64>> {
    let mut pieces = Vec::new();
    for polygon in polygons {
        if polygon.exterior().0.len() < 2 {
            continue;
        }
        let projected = transformer.project_line(polygon.exterior());
        pieces.extend(kernel.clip_line_to_rect(&projected, clip_box).into_lines());
    }

    if keep_longest && pieces.len() > 1 {
        let merged = kernel.merge_lines(pieces);
        pieces = longest(merged).into_iter().collect();
    }

    pieces
}

/// The longest line; the first one wins a tie.
fn longest(lines: Vec<LineString<f64>>) -> Option<LineString<f64>> {
    let mut best: Option<(f64, LineString<f64>)> = None;
    for line in lines {
        let len = line_length(&line);
        if best.as_ref().is_none_or(|(b, _)| len > *b) {
            best = Some((len, line));
        }
    }
    best.map(|(_, line)| line)
}

/// Build the page-space border lines for `country_name`.
///
/// `country` is the target's geographic territory, already looked up.
pub fn extract_borders(
    countries: &FeatureCollection,
    country_name: &str,
    country: &[Polygon<f64>],
    transformer: &Transformer,
    observer: &dyn ProgressObserver,
) -> Vec<LineString<f64>> {
    let kernel = Kernel::planar();
    let clip_box = transformer.drawable_box_projected();

    let neighbors = match MultiPolygon::new(country.to_vec()).bounding_rect() {
        Some(bounds) => {
            let search = Rect::new(
                coord! { x: bounds.min().x - NEIGHBOR_MARGIN_DEG, y: bounds.min().y - NEIGHBOR_MARGIN_DEG },
                coord! { x: bounds.max().x + NEIGHBOR_MARGIN_DEG, y: bounds.max().y + NEIGHBOR_MARGIN_DEG },
            );
            find_neighbors(countries, search, country_name)
        }
        None => Default::default(),
    };
    let names: Vec<&str> = neighbors.keys().map(String::as_str).collect();
    observer.report(Stage::Neighbors, &names.join(", "), neighbors.len());

    let own = project_and_clip_border(country, transformer, clip_box, false, &kernel);
    observer.report(Stage::BorderClipped, country_name, own.len());

    let mut all = own.clone();
    for (name, polygons) in &neighbors {
        let pieces = project_and_clip_border(polygons, transformer, clip_box, true, &kernel);
        observer.report(Stage::BorderClipped, name, pieces.len());
        all.extend(pieces);
    }

    let input_count = all.len();
    let mut lines = kernel.dissolve_lines(all);
    observer.report(
        Stage::BordersMerged,
        &format!("{} input pieces", input_count),
        lines.len(),
    );

    if !own.is_empty() {
        let seed = kernel.buffer_lines(&own, ORPHAN_TOLERANCE_M).into_polygons();
        lines = retain_connected(lines, &seed, ORPHAN_TOLERANCE_M, &kernel);
        observer.report(Stage::BorderOrphans, country_name, lines.len());
    }

    lines.iter().map(|l| transformer.line_to_page(l)).collect()
}

/// Fatten page-space border lines into engrave polygons: half of
/// `border_width_mm` on each side, round caps and joins, clipped to the
/// drawable rectangle.
pub fn build_border_kerf(lines: &[LineString<f64>], border_width_mm: f64, drawable: DrawableRect) -> Vec<Polygon<f64>> {
    let kernel = Kernel::page();
    let buffered = kernel.buffer_lines(lines, border_width_mm / 2.0).into_polygons();
    kernel.clip_polygons_to_rect(&buffered, drawable.to_rect()).into_polygons()
}
