//! JSON output structures for commands

use gpq_core::models::Column;
use serde::Serialize;
use std::path::PathBuf;

/// Output for `gpq inspect`
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub url: String,
    pub success: bool,
    pub message: String,
    pub has_bbox: bool,
    pub bbox_column: Option<String>,
    pub geometry_column: String,
    pub schema: Vec<Column>,
}

/// Planned queries for one source under `--dry-run`
#[derive(Debug, Serialize)]
pub struct PlannedDownload {
    pub url: String,
    pub output: PathBuf,
    pub format: String,
    pub materialize_sql: String,
    pub sample_sql: Option<String>,
    pub export_sql: Option<String>,
}

/// Output for `gpq download`
#[derive(Debug, Serialize)]
pub struct DownloadOutput {
    pub completed: Vec<PathBuf>,
    pub skipped: Vec<String>,
    /// drained, paused, stopped or killed
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One catalog entry for `gpq presets`
#[derive(Debug, Serialize)]
pub struct PresetInfo {
    pub source: String,
    pub key: String,
    pub display_name: String,
    pub locator: String,
    pub needs_validation: bool,
    pub subtypes: Vec<String>,
}

/// One configuration value for `gpq config`
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
