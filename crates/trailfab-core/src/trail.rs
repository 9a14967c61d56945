//! Trail layer: the GPS track as a laser cut-out.
//!
//! The track is projected as one continuous line (gaps between GPX segments
//! are bridged), clipped to the drawable box, and then in page space:
//!
//! 1. fattened to the kerf width with round caps and joins
//! 2. clipped to the drawable rectangle
//! 3. kept inside the country, pulled in by half the border width so the
//!    cut never eats into the engraved border
//! 4. lakes removed, so the cut stops at the shoreline

use geo::{LineString, Polygon};

use crate::config::DrawableRect;
use crate::kernel::Kernel;
use crate::transform::{Transformer, mercator};

/// Project `(lon, lat)` samples to a planar line and clip it to the
/// drawable box. Fewer than two samples give no trail.
pub fn extract_trail(points: &[(f64, f64)], transformer: &Transformer) -> Vec<LineString<f64>> {
    if points.len() < 2 {
        return Vec::new();
    }
    let line: LineString<f64> = points.iter().map(|&(lon, lat)| mercator(lon, lat)).collect();
    Kernel::planar()
        .clip_line_to_rect(&line, transformer.drawable_box_projected())
        .into_lines()
}

/// The country's page-space territory shrunk by `inset_mm`.
pub fn country_inset(country_page: &[Polygon<f64>], inset_mm: f64) -> Vec<Polygon<f64>> {
    let kernel = Kernel::page();
    let territory = kernel.union(country_page.to_vec()).into_polygons();
    kernel.buffer_polygons(&territory, -inset_mm).into_polygons()
}

/// Cut polygons for page-space trail lines.
///
/// `inset` restricts the cut to the country interior when given; `lakes`
/// are removed from the result.
pub fn build_trail_kerf(
    lines: &[LineString<f64>],
    cut_width_mm: f64,
    drawable: DrawableRect,
    inset: Option<&[Polygon<f64>]>,
    lakes: &[Polygon<f64>],
) -> Vec<Polygon<f64>> {
    let kernel = Kernel::page();
    let buffered = kernel.buffer_lines(lines, cut_width_mm / 2.0).into_polygons();
    if buffered.is_empty() {
        return Vec::new();
    }

    let mut cut = kernel.clip_polygons_to_rect(&buffered, drawable.to_rect()).into_polygons();
    if let Some(inset) = inset {
        cut = kernel.intersection(&cut, inset).into_polygons();
    }
    if !lakes.is_empty() {
        let lake_union = kernel.union(lakes.to_vec()).into_polygons();
        cut = kernel.difference(&cut, &lake_union).into_polygons();
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use geo::{Area, BoundingRect, Contains, Point, line_string, polygon};

    fn page() -> PageConfig {
        PageConfig { width_mm: 210.0, height_mm: 148.0, padding_mm: 15.0 }
    }

    fn transformer() -> Transformer {
        let country = polygon![(x: 10.0, y: 45.0), (x: 12.0, y: 45.0), (x: 12.0, y: 46.0), (x: 10.0, y: 46.0)];
        Transformer::new(&[country], &page()).unwrap()
    }

    fn drawable() -> DrawableRect {
        DrawableRect::of_page(&page())
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn short_tracks_are_empty() {
        let t = transformer();
        assert!(extract_trail(&[], &t).is_empty());
        assert!(extract_trail(&[(11.0, 45.5)], &t).is_empty());
    }

    #[test]
    fn track_is_clipped_to_drawable_box() {
        let t = transformer();
        // Leaves the page to the east and comes back
        let points = [(10.5, 45.5), (20.0, 45.5), (20.0, 45.6), (11.0, 45.6)];
        let lines = extract_trail(&points, &t);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn kerf_has_requested_width() {
        let lines = vec![line_string![(x: 50.0, y: 70.0), (x: 150.0, y: 70.0)]];
        let cut = build_trail_kerf(&lines, 1.5, drawable(), None, &[]);
        assert_eq!(cut.len(), 1);
        let bbox = cut[0].bounding_rect().unwrap();
        assert!((bbox.height() - 1.5).abs() < 1e-3);
        assert!((bbox.width() - 101.5).abs() < 0.01, "round caps add half a width each end");
    }

    #[test]
    fn kerf_stays_inside_inset() {
        let lines = vec![line_string![(x: 20.0, y: 70.0), (x: 190.0, y: 70.0)]];
        let inset = country_inset(&[rect(40.0, 40.0, 160.0, 100.0)], 0.5);
        let cut = build_trail_kerf(&lines, 1.5, drawable(), Some(inset.as_slice()), &[]);
        assert_eq!(cut.len(), 1);
        let bbox = cut[0].bounding_rect().unwrap();
        assert!((bbox.min().x - 40.5).abs() < 1e-3);
        assert!((bbox.max().x - 159.5).abs() < 1e-3);
    }

    #[test]
    fn lakes_are_cut_out() {
        let lines = vec![line_string![(x: 50.0, y: 70.0), (x: 150.0, y: 70.0)]];
        let lake = rect(90.0, 60.0, 110.0, 80.0);
        let cut = build_trail_kerf(&lines, 1.5, drawable(), None, &[lake.clone()]);
        assert_eq!(cut.len(), 2, "the lake splits the trail");
        for poly in &cut {
            assert!(!lake.contains(&Point::new(poly.exterior().0[0].x, poly.exterior().0[0].y)));
        }
        let area: f64 = cut.iter().map(|p| p.unsigned_area()).sum();
        assert!(area < 101.5 * 1.5);
    }

    #[test]
    fn no_lines_no_kerf() {
        assert!(build_trail_kerf(&[], 1.5, drawable(), None, &[]).is_empty());
    }
}
