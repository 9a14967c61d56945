//! Flood-fill orphan removal.
//!
//! Clipping a border or river network to the page leaves fragments that
//! belong to some other country's coastline or a river basin next door.
//! Starting from a seed zone, [`retain_connected`] keeps every geometry that
//! can be reached through a chain of touching neighbors and drops the rest.
//!
//! ## Rust Lesson #24: Traits as capabilities
//!
//! The filter only needs two things from a geometry: "do you touch this
//! zone?" and "give me yourself, fattened by d". [`Connectable`] names
//! exactly that, so the same loop serves border lines, river lines and lake
//! polygons without knowing which it has.

use geo::{LineString, Polygon};

use crate::kernel::{self, Kernel};

/// A geometry the flood fill can test and absorb.
pub trait Connectable {
    /// Whether this geometry touches any polygon of the zone.
    fn touches(&self, zone: &[Polygon<f64>]) -> bool;

    /// This geometry grown by `distance`.
    fn inflate(&self, distance: f64, kernel: &Kernel) -> Vec<Polygon<f64>>;
}

impl Connectable for LineString<f64> {
    fn touches(&self, zone: &[Polygon<f64>]) -> bool {
        kernel::line_intersects(self, zone)
    }

    fn inflate(&self, distance: f64, kernel: &Kernel) -> Vec<Polygon<f64>> {
        kernel.buffer_line(self, distance).into_polygons()
    }
}

impl Connectable for Polygon<f64> {
    fn touches(&self, zone: &[Polygon<f64>]) -> bool {
        kernel::polygon_intersects(self, zone)
    }

    fn inflate(&self, distance: f64, kernel: &Kernel) -> Vec<Polygon<f64>> {
        kernel.buffer_polygons(std::slice::from_ref(self), distance).into_polygons()
    }
}

/// Keep the geometries reachable from `seed_zone`.
///
/// Repeatedly scans the unclassified geometries; any that touches the zone
/// is marked connected and the zone grows by that geometry buffered by
/// `tolerance`. Stops after a full pass that connects nothing.
///
/// The result preserves input order.
pub fn retain_connected<G>(geometries: Vec<G>, seed_zone: &[Polygon<f64>], tolerance: f64, kernel: &Kernel) -> Vec<G>
where
    G: Connectable,
{
    if geometries.is_empty() {
        return geometries;
    }

    let mut zone: Vec<Polygon<f64>> = seed_zone.to_vec();
    let mut connected = vec![false; geometries.len()];

    // Invariant: `zone` and the set of `connected` flags only ever grow.
    loop {
        let mut changed = false;
        for (i, geometry) in geometries.iter().enumerate() {
            if connected[i] || !geometry.touches(&zone) {
                continue;
            }
            connected[i] = true;
            changed = true;

            let mut grown = zone;
            grown.extend(geometry.inflate(tolerance, kernel));
            zone = kernel.union(grown).into_polygons();
        }
        if !changed {
            break;
        }
    }

    geometries
        .into_iter()
        .zip(connected)
        .filter_map(|(g, keep)| keep.then_some(g))
        .collect()
}
