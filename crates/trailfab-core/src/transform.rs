//! Coordinate transform: WGS84 -> Web Mercator -> page millimeters.
//!
//! A [`Transformer`] is fitted once to the target country's extent and then
//! shared read-only by every layer builder. It is the only way geometry
//! moves between spaces:
//!
//! ```text
//! geographic (lon, lat deg) --project--> planar (m) --planar_to_page--> page (mm, Y down)
//! ```

use geo::{BoundingRect, Coord, LineString, MapCoords, MultiPolygon, Polygon, Rect, coord};

use crate::config::{DrawableRect, PageConfig};
use crate::error::{Result, TrailfabError};
use crate::geometry::round_to;

/// Spherical Web-Mercator radius (EPSG:3857).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where Web-Mercator's square world ends.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Fraction of the fitted scale actually used, leaving room for neighbor
/// borders on the tight axis.
const INSET: f64 = 0.92;

/// Page coordinates are rounded to this many decimals.
const PAGE_DIGITS: i32 = 4;

/// Project WGS84 degrees to Web-Mercator meters.
///
/// Latitudes beyond the Mercator limit are clamped so polar features stay
/// finite.
#[inline]
pub fn mercator(lon: f64, lat: f64) -> Coord<f64> {
    debug_assert!(lon.is_finite() && lat.is_finite(), "non-finite coordinate ({lon}, {lat})");
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    coord! {
        x: EARTH_RADIUS_M * lon.to_radians(),
        y: EARTH_RADIUS_M * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
    }
}

/// Fitted geographic -> page transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformer {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    x_min: f64,
    y_max: f64,
    drawable: DrawableRect,
}

impl Transformer {
    /// Fit the projected bounding box of `country` into the page's drawable
    /// rectangle, uniformly scaled and centered.
    pub fn new(country: &[Polygon<f64>], page: &PageConfig) -> Result<Self> {
        let bounds = MultiPolygon::new(country.to_vec())
            .bounding_rect()
            .ok_or_else(|| TrailfabError::InvalidGeometry("country has no coordinates".into()))?;

        let lo = mercator(bounds.min().x, bounds.min().y);
        let hi = mercator(bounds.max().x, bounds.max().y);
        let (extent_w, extent_h) = (hi.x - lo.x, hi.y - lo.y);
        if !(extent_w > 0.0 && extent_h > 0.0) {
            return Err(TrailfabError::InvalidGeometry(format!(
                "degenerate country extent {extent_w:.3} x {extent_h:.3} m"
            )));
        }

        let drawable = DrawableRect::of_page(page);
        let (draw_w, draw_h) = (drawable.width(), drawable.height());
        let scale = (draw_w / extent_w).min(draw_h / extent_h) * INSET;

        let projected_w = extent_w * scale;
        let projected_h = extent_h * scale;

        Ok(Self {
            scale,
            offset_x: drawable.x_min + (draw_w - projected_w) / 2.0,
            offset_y: drawable.y_min + (draw_h - projected_h) / 2.0,
            x_min: lo.x,
            y_max: hi.y,
            drawable,
        })
    }

    /// Page millimeters per planar meter.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn drawable(&self) -> DrawableRect {
        self.drawable
    }

    /// WGS84 to page millimeters, rounded to 4 decimals.
    pub fn transform(&self, lon: f64, lat: f64) -> (f64, f64) {
        let page = self.planar_to_page(mercator(lon, lat));
        (page.x, page.y)
    }

    /// Planar meters to page millimeters, rounded to 4 decimals.
    #[inline]
    pub fn planar_to_page(&self, c: Coord<f64>) -> Coord<f64> {
        coord! {
            x: round_to((c.x - self.x_min) * self.scale + self.offset_x, PAGE_DIGITS),
            y: round_to((self.y_max - c.y) * self.scale + self.offset_y, PAGE_DIGITS),
        }
    }

    /// The drawable rectangle expressed in planar meters.
    pub fn drawable_box_projected(&self) -> Rect<f64> {
        let d = &self.drawable;
        Rect::new(
            coord! {
                x: (d.x_min - self.offset_x) / self.scale + self.x_min,
                y: self.y_max - (d.y_max - self.offset_y) / self.scale,
            },
            coord! {
                x: (d.x_max - self.offset_x) / self.scale + self.x_min,
                y: self.y_max - (d.y_min - self.offset_y) / self.scale,
            },
        )
    }

    // ------------------------------------------------------------------
    // Whole-geometry helpers
    // ------------------------------------------------------------------

    pub fn project_line(&self, line: &LineString<f64>) -> LineString<f64> {
        line.map_coords(|c| mercator(c.x, c.y))
    }

    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| mercator(c.x, c.y))
    }

    pub fn line_to_page(&self, line: &LineString<f64>) -> LineString<f64> {
        line.map_coords(|c| self.planar_to_page(c))
    }

    pub fn polygon_to_page(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.planar_to_page(c))
    }

    /// Geographic polygon straight to page space.
    pub fn geographic_polygon_to_page(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.planar_to_page(mercator(c.x, c.y)))
    }
}
