//! Water layer: rivers and lakes inside the drawable area.
//!
//! Rivers come from global and regional center-line datasets, lakes from
//! global and regional polygon datasets. Both are projected, clipped to the
//! drawable box and dissolved (a river present in both datasets collapses
//! to one line). Rivers are then cut where they run through a lake, and
//! rivers that never reach the target country are dropped.
//!
//! [`build_water_kerf`] turns the page-space result into engrave polygons:
//! buffered river lines, buffered lake outlines and buffered lake hatching.

use geo::{Intersects, LineString, Polygon};

use crate::config::{DrawableRect, FabricationConfig};
use crate::connectivity::retain_connected;
use crate::dataset::FeatureCollection;
use crate::hatch::generate_hatch_lines;
use crate::kernel::{self, Kernel};
use crate::progress::{ProgressObserver, Stage};
use crate::transform::Transformer;

/// Reach of the country's territory, and of each connected river, planar meters.
pub const WATER_TOUCH_M: f64 = 500.0;

/// Rivers trimmed by a lake end on its grid-rounded outline; lakes join the
/// seed grown by this much so those ends still touch them.
const LAKE_SNAP_M: f64 = 1.0;

/// Rivers and lakes in one coordinate space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterFeatures {
    pub rivers: Vec<LineString<f64>>,
    pub lakes: Vec<Polygon<f64>>,
}

impl WaterFeatures {
    /// Same features in page millimeters.
    pub fn to_page(&self, transformer: &Transformer) -> WaterFeatures {
        WaterFeatures {
            rivers: self.rivers.iter().map(|l| transformer.line_to_page(l)).collect(),
            lakes: self.lakes.iter().map(|p| transformer.polygon_to_page(p)).collect(),
        }
    }
}

/// Extract planar rivers and lakes for the drawable area.
///
/// `country` is the target's planar territory; when given, rivers not
/// connected to it (directly, through a lake touching it, or through other
/// connected rivers) are removed.
pub fn extract_water(
    river_sets: &[FeatureCollection],
    lake_sets: &[FeatureCollection],
    country: Option<&[Polygon<f64>]>,
    transformer: &Transformer,
    observer: &dyn ProgressObserver,
) -> WaterFeatures {
    let kernel = Kernel::planar();
    let clip_box = transformer.drawable_box_projected();

    // --- Rivers ---
    let mut pieces = Vec::new();
    for line in river_sets.iter().flat_map(FeatureCollection::lines) {
        let projected = transformer.project_line(&line);
        if !projected.intersects(&clip_box) {
            continue;
        }
        pieces.extend(kernel.clip_line_to_rect(&projected, clip_box).into_lines());
    }
    let mut rivers = kernel.dissolve_lines(pieces);
    observer.report(Stage::Rivers, "rivers", rivers.len());

    // --- Lakes ---
    let mut lake_pieces = Vec::new();
    for polygon in lake_sets.iter().flat_map(FeatureCollection::polygons) {
        let projected = transformer.project_polygon(&polygon);
        if !projected.intersects(&clip_box) {
            continue;
        }
        lake_pieces.extend(kernel.clip_polygons_to_rect(&[projected], clip_box).into_polygons());
    }
    let lakes = kernel.union(lake_pieces).into_polygons();
    observer.report(Stage::Lakes, "lakes", lakes.len());

    // --- Cut rivers where they cross lakes ---
    if !rivers.is_empty() && !lakes.is_empty() {
        let before = rivers.len();
        rivers = rivers
            .iter()
            .flat_map(|line| kernel.subtract_from_line(line, &lakes).into_lines())
            .collect();
        observer.report(Stage::RiversTrimmed, &format!("{} before", before), rivers.len());
    }

    // --- Drop rivers that never reach the country ---
    if let Some(country) = country.filter(|_| !rivers.is_empty()) {
        let territory = kernel.buffer_polygons(country, WATER_TOUCH_M).into_polygons();
        let touching: Vec<Polygon<f64>> = lakes
            .iter()
            .filter(|lake| kernel::polygon_intersects(lake, &territory))
            .cloned()
            .collect();
        let mut seed = territory;
        seed.extend(kernel.buffer_polygons(&touching, LAKE_SNAP_M).into_polygons());
        let seed = kernel.union(seed).into_polygons();

        rivers = retain_connected(rivers, &seed, WATER_TOUCH_M, &kernel);
        observer.report(Stage::RiverOrphans, "rivers", rivers.len());
    }

    WaterFeatures { rivers, lakes }
}

/// Page-space lines that make up the water engraving: rivers, lake outlines
/// (exterior and holes) and lake hatching.
pub fn water_strokes(water: &WaterFeatures, fab: &FabricationConfig) -> Vec<LineString<f64>> {
    let mut strokes: Vec<LineString<f64>> = water.rivers.iter().filter(|l| l.0.len() >= 2).cloned().collect();
    for lake in &water.lakes {
        strokes.push(lake.exterior().clone());
        strokes.extend(lake.interiors().iter().cloned());
        strokes.extend(generate_hatch_lines(lake, fab.hatch_spacing_mm, fab.hatch_angle_deg));
    }
    strokes
}

/// Engrave polygons for page-space water: every stroke buffered by
/// `river_buffer_mm`, unioned, clipped to the drawable rectangle.
pub fn build_water_kerf(water: &WaterFeatures, fab: &FabricationConfig, drawable: DrawableRect) -> Vec<Polygon<f64>> {
    let kernel = Kernel::page();
    let strokes = water_strokes(water, fab);
    let buffered = kernel.buffer_lines(&strokes, fab.river_buffer_mm).into_polygons();
    kernel.clip_polygons_to_rect(&buffered, drawable.to_rect()).into_polygons()
}
