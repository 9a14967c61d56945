//! # trailfab-core
//!
//! Turns a GPS track plus Natural Earth vector datasets into layered page
//! geometry for a pen plotter and a laser cutter.
//!
//! ## Rust Lesson #7: Modules
//!
//! Rust modules are like ES6 modules but more explicit:
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level
//!
//! Unlike Node.js, you must explicitly declare every module.
//!
//! Modules, leaf first: `geometry` and `kernel` (planar booleans and
//! offsets), `chain`/`clip`/`hatch` (line helpers), `transform` (projection
//! onto the page), `connectivity` (orphan removal), then the layer builders
//! `borders`, `water`, `trail`, and `pipeline` tying them together. `svg`
//! writes the documents, drawing captions with the `font` stroke font.

pub mod borders;
pub mod chain;
pub mod clip;
pub mod config;
pub mod connectivity;
pub mod dataset;
pub mod error;
pub mod font;
pub mod geometry;
pub mod gpx;
pub mod hatch;
pub mod kernel;
pub mod pipeline;
pub mod progress;
pub mod svg;
pub mod trail;
pub mod transform;
pub mod water;

// Re-export common types at crate root for convenience.
pub use config::{Config, DrawableRect, Edge, StitchEdge, drawable_rect, mm_to_px, page_scale, resolve_stitch_edge, trail_cut_width_mm};
pub use dataset::{DatasetSource, DirectorySource, Feature, FeatureCollection, MemorySource};
pub use error::{Result, TrailfabError};
pub use geometry::Shape;
pub use gpx::{parse_gpx, parse_gpx_file};
pub use kernel::Kernel;
pub use pipeline::{Composition, Documents, generate, render_documents, size_suffix};
pub use progress::{NullObserver, ProgressObserver, Stage, TracingObserver};
pub use svg::{render_laser_svg, render_plotter_svg, stitch_holes};
pub use transform::Transformer;
