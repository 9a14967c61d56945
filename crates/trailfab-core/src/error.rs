//! Error types for the trailfab pipeline.
//!
//! Only conditions a user can cause (bad config, missing data, unreadable
//! files) are errors. Empty geometry at any stage is not an error - it
//! flows through as an empty set.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop a generation run.
///
/// ## Rust Lesson #20: Error Handling
///
/// Rust uses `Result<T, E>` instead of exceptions. `thiserror` derives the
/// `Display` and `Error` impls from the `#[error(...)]` attributes, and
/// `#[from]` lets `?` convert a library error into ours automatically.
#[derive(Error, Debug)]
pub enum TrailfabError {
    /// The requested country is not in the admin-boundaries dataset.
    #[error("Country '{0}' not found in dataset")]
    CountryNotFound(String),

    /// A dataset was found but could not be used.
    #[error("Dataset '{id}': {reason}")]
    Dataset { id: String, reason: String },

    /// A dataset file could not be read.
    #[error("Failed to read dataset {path}: {source}")]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A dataset file is not valid GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The GPX document could not be parsed.
    #[error("GPX parse error: {0}")]
    Gpx(String),

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file is not valid YAML for [`crate::Config`].
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Input geometry cannot support the requested operation.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TrailfabError>;
