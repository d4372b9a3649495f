//! Error types for gpq

use std::path::PathBuf;
use thiserror::Error;

/// Text fragment the query engine uses when a filter leaves nothing to export
pub const NO_DATA_MARKER: &str = "No data found";

#[derive(Debug, Error)]
pub enum GpqError {
    // Source errors
    #[error("Invalid dataset locator '{url}': must start with http://, https://, s3://, hf://, or file://")]
    InvalidLocator { url: String },

    #[error("Preset not found: {name}")]
    PresetNotFound { name: String },

    // Output errors
    #[error("Unsupported output format: '{extension}'")]
    UnsupportedFormat { extension: String },

    #[error("Output path has no file extension: {path}")]
    MissingExtension { path: PathBuf },

    // CRS errors
    #[error("Unsupported CRS: EPSG:{epsg}")]
    UnsupportedCrs { epsg: u32 },

    #[error("Projection from EPSG:{from} to EPSG:{to} failed: {reason}")]
    Projection { from: u32, to: u32, reason: String },

    #[error("Invalid bounding box: {reason}")]
    InvalidBoundingBox { reason: String },

    // Engine errors
    #[error("{0}")]
    Engine(String),

    #[error("Invalid geo metadata: {0}")]
    Metadata(String),

    #[error("No data found in the requested area")]
    NoData,

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GpqError {
    /// Wrap an engine error, keeping its text verbatim
    pub fn engine(err: impl std::fmt::Display) -> Self {
        GpqError::Engine(err.to_string())
    }

    /// True when the error only signals that nothing matched the area of interest
    pub fn is_no_data(&self) -> bool {
        match self {
            GpqError::NoData => true,
            GpqError::Engine(text) => text.contains(NO_DATA_MARKER),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GpqError {
    fn from(err: serde_json::Error) -> Self {
        GpqError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GpqError>;
