//! Generation configuration.
//!
//! A [`Config`] is built once (from defaults or a YAML file) and never
//! mutated while the pipeline runs. Anything derived from it - the drawable
//! rectangle, the page scale, the auto-sized trail kerf - is a free function
//! below rather than a cached field.

use std::fs;
use std::path::Path;

use geo::{Rect, coord};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailfabError};
use crate::geometry::round_to;

/// Reference design: A5 landscape, the page the default widths were tuned on.
const REF_WIDTH_MM: f64 = 210.0;
const REF_HEIGHT_MM: f64 = 148.0;
const REF_CUT_WIDTH_MM: f64 = 1.5;

/// SVG user units per inch.
pub const DPI: f64 = 96.0;

/// A complete generation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target country, matched against `NAME` or `ADMIN`
    pub country: String,
    pub page: PageConfig,
    pub trail: TrailConfig,
    pub fabrication: FabricationConfig,
    pub stitch: StitchConfig,
    pub caption: CaptionConfig,
    pub datasets: DatasetConfig,
    /// Emit the pen-plotter document
    pub output_plotter: bool,
    /// Emit the laser document
    pub output_laser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: "Hungary".to_string(),
            page: PageConfig::default(),
            trail: TrailConfig::default(),
            fabrication: FabricationConfig::default(),
            stitch: StitchConfig::default(),
            caption: CaptionConfig::default(),
            datasets: DatasetConfig::default(),
            output_plotter: true,
            output_laser: true,
        }
    }
}

/// Page size and margin, millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width_mm: f64,
    pub height_mm: f64,
    pub padding_mm: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: REF_WIDTH_MM,
            height_mm: REF_HEIGHT_MM,
            padding_mm: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Explicit kerf width. `None` scales the reference width to the page.
    pub cut_width_mm: Option<f64>,
    /// Plotter pen width for the trail layer
    pub stroke_mm: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            cut_width_mm: None,
            stroke_mm: 0.1,
        }
    }
}

/// Stroke widths, buffer widths and colors for both fabrication paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricationConfig {
    pub border_stroke_mm: f64,
    pub water_stroke_mm: f64,
    pub river_buffer_mm: f64,
    pub hatch_spacing_mm: f64,
    pub hatch_angle_deg: f64,
    pub laser_border_width_mm: f64,
    pub laser_hairline_mm: f64,
    pub laser_cut_color: String,
    pub laser_engrave_color: String,
}

impl Default for FabricationConfig {
    fn default() -> Self {
        Self {
            border_stroke_mm: 1.0,
            water_stroke_mm: 0.1,
            river_buffer_mm: 0.15,
            hatch_spacing_mm: 0.5,
            hatch_angle_deg: 45.0,
            laser_border_width_mm: 1.0,
            laser_hairline_mm: 0.01,
            laser_cut_color: "#FF0000".to_string(),
            laser_engrave_color: "#000000".to_string(),
        }
    }
}

/// Which page edge carries the stitch holes.
///
/// `Long` and `Short` are resolved against the page shape by
/// [`resolve_stitch_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchEdge {
    Long,
    Short,
    Top,
    Bottom,
    Left,
    Right,
}

/// A concrete page edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub fn name(&self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
            Edge::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub enabled: bool,
    pub edge: StitchEdge,
    pub hole_diameter_mm: f64,
    pub hole_count: u32,
    /// Distance of the hole centers from the stitched edge
    pub offset_mm: f64,
    /// Distance of the first and last hole from the perpendicular edges
    pub edge_inset_mm: f64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            edge: StitchEdge::Long,
            hole_diameter_mm: 1.0,
            hole_count: 5,
            offset_mm: 10.0,
            edge_inset_mm: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub title: String,
    pub subtitle: String,
    pub title_size_mm: f64,
    pub subtitle_size_mm: f64,
    pub title_y_mm: f64,
    pub subtitle_y_mm: f64,
    /// Pen width on the plotter, engraved line width on the laser
    pub stroke_mm: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            title_size_mm: 5.0,
            subtitle_size_mm: 3.5,
            title_y_mm: 139.0,
            subtitle_y_mm: 143.5,
            stroke_mm: 0.3,
        }
    }
}

/// Dataset identifiers handed to the [`crate::dataset::DatasetSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub countries: String,
    pub rivers_global: String,
    pub rivers_regional: String,
    pub lakes_global: String,
    pub lakes_regional: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            countries: "ne_10m_admin_0_countries".to_string(),
            rivers_global: "ne_10m_rivers_lake_centerlines".to_string(),
            rivers_regional: "ne_10m_rivers_europe".to_string(),
            lakes_global: "ne_10m_lakes".to_string(),
            lakes_regional: "ne_10m_lakes_europe".to_string(),
        }
    }
}

impl Config {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would leave the pipeline without a page to draw on.
    pub fn validate(&self) -> Result<()> {
        let page = &self.page;
        if !(page.width_mm.is_finite() && page.width_mm > 0.0 && page.height_mm.is_finite() && page.height_mm > 0.0) {
            return Err(TrailfabError::InvalidConfig(format!(
                "page must have positive size, got {}x{}mm",
                page.width_mm, page.height_mm
            )));
        }
        if !(page.padding_mm >= 0.0
            && page.padding_mm * 2.0 < page.width_mm
            && page.padding_mm * 2.0 < page.height_mm)
        {
            return Err(TrailfabError::InvalidConfig(format!(
                "padding {}mm leaves no drawable area on a {}x{}mm page",
                page.padding_mm, page.width_mm, page.height_mm
            )));
        }

        let fab = &self.fabrication;
        require_positive("hatch_spacing_mm", fab.hatch_spacing_mm)?;
        require_positive("river_buffer_mm", fab.river_buffer_mm)?;
        require_positive("laser_border_width_mm", fab.laser_border_width_mm)?;
        require_positive("caption stroke_mm", self.caption.stroke_mm)?;
        if !fab.hatch_angle_deg.is_finite() {
            return Err(TrailfabError::InvalidConfig(
                "hatch_angle_deg must be a finite number".to_string(),
            ));
        }
        if let Some(width) = self.trail.cut_width_mm {
            require_positive("trail cut_width_mm", width)?;
        }

        if self.stitch.enabled && self.stitch.hole_count == 0 {
            return Err(TrailfabError::InvalidConfig(
                "stitch hole_count must be at least 1 when stitching is enabled".to_string(),
            ));
        }
        if self.country.trim().is_empty() {
            return Err(TrailfabError::InvalidConfig("country must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Widths and spacings must be finite and strictly positive. NaN fails
/// every comparison, so the check is written to reject it.
fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrailfabError::InvalidConfig(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

// ============================================================================
// DERIVED QUANTITIES
// ============================================================================

/// The printable area of the page, millimeters, Y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawableRect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl DrawableRect {
    /// Page minus its padding on every side.
    pub fn of_page(page: &PageConfig) -> Self {
        Self {
            x_min: page.padding_mm,
            y_min: page.padding_mm,
            x_max: page.width_mm - page.padding_mm,
            y_max: page.height_mm - page.padding_mm,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.x_min, y: self.y_min },
            coord! { x: self.x_max, y: self.y_max },
        )
    }

    /// Whether a point lies inside the rectangle, allowing `eps` slack.
    pub fn contains(&self, x: f64, y: f64, eps: f64) -> bool {
        x >= self.x_min - eps && x <= self.x_max + eps && y >= self.y_min - eps && y <= self.y_max + eps
    }
}

pub fn drawable_rect(config: &Config) -> DrawableRect {
    DrawableRect::of_page(&config.page)
}

/// Scale of this page relative to the 210x148mm reference, by diagonal.
pub fn page_scale(config: &Config) -> f64 {
    config.page.width_mm.hypot(config.page.height_mm) / REF_WIDTH_MM.hypot(REF_HEIGHT_MM)
}

/// Effective trail kerf: the explicit value, or the reference width scaled
/// to the page and rounded to 0.01mm.
pub fn trail_cut_width_mm(config: &Config) -> f64 {
    match config.trail.cut_width_mm {
        Some(width) => width,
        None => round_to(REF_CUT_WIDTH_MM * page_scale(config), 2),
    }
}

/// Millimeters to SVG user units, rounded to 4 decimals.
#[inline]
pub fn mm_to_px(value_mm: f64) -> f64 {
    round_to(value_mm * DPI / 25.4, 4)
}

/// Resolve `long`/`short` against the page shape. Square pages count as
/// landscape, so `long` gives `top`.
pub fn resolve_stitch_edge(config: &Config) -> Edge {
    let landscape = config.page.width_mm >= config.page.height_mm;
    match config.stitch.edge {
        StitchEdge::Top => Edge::Top,
        StitchEdge::Bottom => Edge::Bottom,
        StitchEdge::Left => Edge::Left,
        StitchEdge::Right => Edge::Right,
        StitchEdge::Long => {
            if landscape {
                Edge::Top
            } else {
                Edge::Left
            }
        }
        StitchEdge::Short => {
            if landscape {
                Edge::Left
            } else {
                Edge::Top
            }
        }
    }
}
