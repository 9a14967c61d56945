//! Hatch line generation for filled areas.
//!
//! Lakes are drawn as their outline plus parallel interior lines. The
//! polygon is rotated so the hatch direction becomes horizontal, sliced
//! with scanlines, and the kept spans are rotated back.

use geo::{BoundingRect, Centroid, LineString, Polygon, Rotate};

use crate::clip::clip_scanline;

/// Generate parallel hatch lines clipped to a polygon.
///
/// Scanlines start one `spacing` above the rotated polygon's bottom and
/// continue while strictly below its top, each spanning one unit past the
/// rotated bounds on both sides. Holes are excluded.
///
/// ## Rust Lesson #17: f64 Methods
///
/// Rust's f64 has methods for math: `.sin()`, `.cos()`, `.sqrt()`, etc.
/// Here `geo`'s `Rotate` trait does the trigonometry; angles are degrees,
/// positive counter-clockwise.
pub fn generate_hatch_lines(polygon: &Polygon<f64>, spacing: f64, angle_degrees: f64) -> Vec<LineString<f64>> {
    if !(spacing > 0.0) || polygon.exterior().0.len() < 4 {
        return Vec::new();
    }

    // ## Rust Lesson #18: let-else
    //
    // `let Some(x) = expr else { return }` is a clean way to
    // unwrap an Option and handle the None case.
    let Some(centroid) = polygon.centroid() else {
        return Vec::new();
    };

    let rotated = polygon.rotate_around_point(-angle_degrees, centroid);
    let Some(bounds) = rotated.bounding_rect() else {
        return Vec::new();
    };

    let (min_x, max_x) = (bounds.min().x, bounds.max().x);
    let max_y = bounds.max().y;

    let mut lines = Vec::new();
    let mut y = bounds.min().y + spacing;
    while y < max_y {
        for span in clip_scanline(y, min_x - 1.0, max_x + 1.0, &rotated) {
            lines.push(span.to_line_string().rotate_around_point(angle_degrees, centroid));
        }
        y += spacing;
    }

    lines
}

// ============================================================================
// TESTS
// ============================================================================
