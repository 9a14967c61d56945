//! Planar geometry kernel.
//!
//! Boolean operations and offsets go through Clipper (via `geo-clipper`),
//! which works on integer coordinates. A [`Kernel`] fixes the scale factor
//! for one coordinate space, so planar meters and page millimeters each get
//! a precision that suits them:
//!
//! - planar: 1 cm grid, coordinates up to ~2e7 m
//! - page: 0.0001 mm grid, matching the 4-digit rounding of page output
//!
//! Every operation returns a [`Shape`]; callers flatten it with
//! `into_polygons()` / `into_lines()`.

use geo::orient::{Direction, Orient};
use geo::{Coord, Intersects, LineString, MapCoords, MultiLineString, MultiPolygon, Polygon, Rect};
use geo_clipper::{Clipper, ClipperOpen, EndType, JoinType};

use crate::chain;
use crate::geometry::Shape;

/// Boolean/offset operations bound to one coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    /// Multiplier from geometry units to Clipper integer units
    factor: f64,
    /// Maximum deviation of round joins/caps from a true arc, geometry units
    arc_tolerance: f64,
}

impl Kernel {
    /// Kernel for projected (Web-Mercator meter) geometry.
    pub const fn planar() -> Self {
        Self {
            factor: 100.0,
            arc_tolerance: 1.0,
        }
    }

    /// Kernel for page (millimeter) geometry.
    pub const fn page() -> Self {
        Self {
            factor: 10_000.0,
            arc_tolerance: 0.002,
        }
    }

    /// Smallest distinguishable distance in this space.
    #[inline]
    pub fn resolution(&self) -> f64 {
        1.0 / self.factor
    }

    /// Clipper measures arc tolerance in its own integer units.
    fn round_join(&self) -> JoinType {
        JoinType::Round(self.arc_tolerance * self.factor)
    }

    // ------------------------------------------------------------------
    // Polygon booleans
    // ------------------------------------------------------------------

    /// Union of any number of polygons, overlapping or not.
    ///
    /// Reduced pairwise as a balanced tree so each Clipper call sees two
    /// already-dissolved operands.
    pub fn union(&self, polygons: Vec<Polygon<f64>>) -> Shape {
        let mut layer: Vec<MultiPolygon<f64>> = polygons
            .into_iter()
            .filter(|p| p.exterior().0.len() >= 4)
            .map(|p| MultiPolygon::new(vec![p.orient(Direction::Default)]))
            .collect();

        if layer.is_empty() {
            return Shape::Empty;
        }

        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut iter = layer.into_iter();
            while let Some(a) = iter.next() {
                match iter.next() {
                    Some(b) => next.push(Clipper::union(&a, &b, self.factor)),
                    None => next.push(a),
                }
            }
            layer = next;
        }

        // A single input still goes through Clipper so self-overlaps dissolve.
        let only = layer.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()));
        let dissolved = Clipper::union(&only, &MultiPolygon::new(Vec::new()), self.factor);
        Shape::from_polygons(dissolved)
    }

    /// Area shared by `subject` and `clip`.
    pub fn intersection(&self, subject: &[Polygon<f64>], clip: &[Polygon<f64>]) -> Shape {
        if subject.is_empty() || clip.is_empty() {
            return Shape::Empty;
        }
        let a = oriented(subject);
        let b = oriented(clip);
        Shape::from_polygons(Clipper::intersection(&a, &b, self.factor))
    }

    /// Area of `subject` not covered by `clip`.
    pub fn difference(&self, subject: &[Polygon<f64>], clip: &[Polygon<f64>]) -> Shape {
        if subject.is_empty() {
            return Shape::Empty;
        }
        let a = oriented(subject);
        if clip.is_empty() {
            return Shape::from_polygons(a);
        }
        let b = oriented(clip);
        Shape::from_polygons(Clipper::difference(&a, &b, self.factor))
    }

    /// Intersect polygons with an axis-aligned rectangle.
    pub fn clip_polygons_to_rect(&self, polygons: &[Polygon<f64>], rect: Rect<f64>) -> Shape {
        self.intersection(polygons, &[rect.to_polygon()])
    }

    // ------------------------------------------------------------------
    // Open paths
    // ------------------------------------------------------------------

    /// Parts of a line inside `region`.
    pub fn clip_line(&self, line: &LineString<f64>, region: &[Polygon<f64>]) -> Shape {
        if line.0.len() < 2 || region.is_empty() {
            return Shape::Empty;
        }
        let region = oriented(region);
        let path = MultiLineString::new(vec![line.clone()]);
        Shape::from_lines(ClipperOpen::intersection(&path, &region, self.factor))
    }

    /// Parts of a line inside an axis-aligned rectangle.
    pub fn clip_line_to_rect(&self, line: &LineString<f64>, rect: Rect<f64>) -> Shape {
        self.clip_line(line, &[rect.to_polygon()])
    }

    /// Parts of a line outside `region`.
    pub fn subtract_from_line(&self, line: &LineString<f64>, region: &[Polygon<f64>]) -> Shape {
        if line.0.len() < 2 {
            return Shape::Empty;
        }
        if region.is_empty() {
            return Shape::Line(line.clone());
        }
        let region = oriented(region);
        let path = MultiLineString::new(vec![line.clone()]);
        Shape::from_lines(ClipperOpen::difference(&path, &region, self.factor))
    }

    // ------------------------------------------------------------------
    // Offsets
    // ------------------------------------------------------------------

    /// Buffer one line with round caps and joins.
    pub fn buffer_line(&self, line: &LineString<f64>, distance: f64) -> Shape {
        self.buffer_lines(std::slice::from_ref(line), distance)
    }

    /// Buffer many lines with round caps and joins; the result is already
    /// the union of the individual buffers.
    ///
    /// Clipper drops an open path whose vertices all share one integer y
    /// before offsetting it, so such lines are offset transposed (x and y
    /// swapped) and swapped back.
    pub fn buffer_lines(&self, lines: &[LineString<f64>], distance: f64) -> Shape {
        if !(distance > 0.0) {
            return Shape::Empty;
        }
        let (flat, sloped): (Vec<LineString<f64>>, Vec<LineString<f64>>) = lines
            .iter()
            .filter(|l| l.0.len() >= 2)
            .cloned()
            .partition(|l| self.is_horizontal(l));

        match (flat.is_empty(), sloped.is_empty()) {
            (true, true) => Shape::Empty,
            (true, false) => Shape::from_polygons(self.offset_open(sloped, distance)),
            (false, true) => Shape::from_polygons(self.offset_transposed(&flat, distance)),
            (false, false) => {
                let mut pieces = self.offset_open(sloped, distance).0;
                pieces.extend(self.offset_transposed(&flat, distance).0);
                self.union(pieces)
            }
        }
    }

    fn offset_open(&self, lines: Vec<LineString<f64>>, distance: f64) -> MultiPolygon<f64> {
        ClipperOpen::offset(
            &MultiLineString::new(lines),
            distance,
            self.round_join(),
            EndType::OpenRound(self.arc_tolerance * self.factor),
            self.factor,
        )
    }

    fn offset_transposed(&self, lines: &[LineString<f64>], distance: f64) -> MultiPolygon<f64> {
        let swapped: Vec<LineString<f64>> = lines.iter().map(|l| l.map_coords(transpose)).collect();
        let buffered = self.offset_open(swapped, distance);
        MultiPolygon::new(
            buffered
                .0
                .iter()
                .map(|p| p.map_coords(transpose).orient(Direction::Default))
                .collect(),
        )
    }

    /// Every vertex lands on the same row of Clipper's integer grid.
    fn is_horizontal(&self, line: &LineString<f64>) -> bool {
        let row = |c: &Coord<f64>| (c.y * self.factor) as i64;
        let first = row(&line.0[0]);
        line.0.iter().all(|c| row(c) == first)
    }

    /// Grow (positive) or shrink (negative) polygons with round joins.
    pub fn buffer_polygons(&self, polygons: &[Polygon<f64>], distance: f64) -> Shape {
        if polygons.is_empty() {
            return Shape::Empty;
        }
        let multi = oriented(polygons);
        Shape::from_polygons(Clipper::offset(
            &multi,
            distance,
            self.round_join(),
            EndType::ClosedPolygon,
            self.factor,
        ))
    }

    // ------------------------------------------------------------------
    // Line networks
    // ------------------------------------------------------------------

    /// Join lines that meet end to end at nodes where exactly two lines meet.
    pub fn merge_lines(&self, lines: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
        chain::merge_lines(&lines, self.resolution())
    }

    /// Collapse duplicated segments, then merge into maximal lines.
    pub fn dissolve_lines(&self, lines: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
        let unique = chain::dedup_segments(&lines, self.resolution());
        chain::merge_lines(&unique, self.resolution())
    }
}

/// Orient every ring (exterior CCW, holes CW) so Clipper's non-zero fill
/// agrees with the even-odd reading of the data.
fn oriented(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons.iter().map(|p| p.orient(Direction::Default)).collect())
}

fn transpose(c: Coord<f64>) -> Coord<f64> {
    Coord { x: c.y, y: c.x }
}

/// Whether a line touches any of the polygons.
pub fn line_intersects(line: &LineString<f64>, polygons: &[Polygon<f64>]) -> bool {
    polygons.iter().any(|p| line.intersects(p))
}

/// Whether a polygon touches any of the polygons.
pub fn polygon_intersects(polygon: &Polygon<f64>, polygons: &[Polygon<f64>]) -> bool {
    polygons.iter().any(|p| polygon.intersects(p))
}
