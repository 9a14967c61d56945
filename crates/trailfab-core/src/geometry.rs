//! Core geometry types for trailfab.
//!
//! Polygons and polylines are `geo` types throughout. This module adds the
//! two things every stage needs on top of them:
//!
//! - [`Shape`], the one place where "whatever a boolean op handed back" is
//!   flattened into the leaf polygons or leaf lines the caller wants
//! - [`Segment`], a plain two-point line used by scanline clipping and
//!   line chaining
//!
//! ## Rust Lesson #3: Enums that own their data
//!
//! A clip can produce nothing, one line, many lines, or a mix. Instead of
//! checking a type tag at every call site, the result is an enum and the
//! compiler makes sure every variant is handled exactly once - in
//! [`Shape::into_lines`] and [`Shape::into_polygons`].

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};

/// Round to a fixed number of decimal digits.
///
/// Page coordinates are rounded to 4 digits so reruns are byte-identical.
#[inline]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Result of any geometry operation, normalized to one type.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Empty,
    Line(LineString<f64>),
    MultiLine(MultiLineString<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    /// Heterogeneous collection, e.g. a GeoJSON GeometryCollection
    Mixed(Vec<Shape>),
}

impl Shape {
    pub fn from_lines(mut lines: MultiLineString<f64>) -> Self {
        match lines.0.len() {
            0 => Shape::Empty,
            1 => Shape::Line(lines.0.remove(0)),
            _ => Shape::MultiLine(lines),
        }
    }

    pub fn from_polygons(polygons: MultiPolygon<f64>) -> Self {
        match polygons.0.len() {
            0 => Shape::Empty,
            _ => Shape::MultiPolygon(polygons),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Shape::Empty => true,
            Shape::Line(line) => line.0.is_empty(),
            Shape::MultiLine(lines) => lines.0.iter().all(|l| l.0.is_empty()),
            Shape::Polygon(poly) => poly.exterior().0.is_empty(),
            Shape::MultiPolygon(polys) => polys.0.iter().all(|p| p.exterior().0.is_empty()),
            Shape::Mixed(parts) => parts.iter().all(Shape::is_empty),
        }
    }

    /// Every leaf line with at least two points, in order.
    ///
    /// Polygons are not lines and are dropped.
    pub fn into_lines(self) -> Vec<LineString<f64>> {
        let mut out = Vec::new();
        self.collect_lines(&mut out);
        out
    }

    fn collect_lines(self, out: &mut Vec<LineString<f64>>) {
        match self {
            Shape::Line(line) => {
                if line.0.len() >= 2 {
                    out.push(line);
                }
            }
            Shape::MultiLine(lines) => out.extend(lines.0.into_iter().filter(|l| l.0.len() >= 2)),
            Shape::Mixed(parts) => {
                for part in parts {
                    part.collect_lines(out);
                }
            }
            Shape::Empty | Shape::Polygon(_) | Shape::MultiPolygon(_) => {}
        }
    }

    /// Every leaf polygon with a usable exterior, in order.
    ///
    /// Lines have no area and are dropped.
    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        let mut out = Vec::new();
        self.collect_polygons(&mut out);
        out
    }

    fn collect_polygons(self, out: &mut Vec<Polygon<f64>>) {
        match self {
            Shape::Polygon(poly) => {
                if is_usable_polygon(&poly) {
                    out.push(poly);
                }
            }
            Shape::MultiPolygon(polys) => out.extend(polys.0.into_iter().filter(is_usable_polygon)),
            Shape::Mixed(parts) => {
                for part in parts {
                    part.collect_polygons(out);
                }
            }
            Shape::Empty | Shape::Line(_) | Shape::MultiLine(_) => {}
        }
    }
}

/// A closed exterior needs at least three distinct corners.
fn is_usable_polygon(poly: &Polygon<f64>) -> bool {
    poly.exterior().0.len() >= 4
}

/// A line segment defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn start(&self) -> Coord<f64> {
        Coord { x: self.x1, y: self.y1 }
    }

    #[inline]
    pub fn end(&self) -> Coord<f64> {
        Coord { x: self.x2, y: self.y2 }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::new(vec![self.start(), self.end()])
    }
}

/// Euclidean length of a polyline.
pub fn line_length(line: &LineString<f64>) -> f64 {
    segments_of(line).map(|s| s.length()).sum()
}

/// Split a polyline into its segments.
pub fn segments_of(line: &LineString<f64>) -> impl Iterator<Item = Segment> + '_ {
    line.lines()
        .map(|l| Segment::new(l.start.x, l.start.y, l.end.x, l.end.y))
}
