use crate::error::{GpqError, Result};
use crate::models::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Large-file threshold for verbose text exports, in MB
pub const DEFAULT_SIZE_THRESHOLD_MB: f64 = 4096.0;

/// Rows sampled when estimating output size
pub const DEFAULT_SAMPLE_ROWS: usize = 100;

/// Capacity of each job's progress channel
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has at least the same precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() >= self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for gpq
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub size_threshold_mb: ConfigValue<f64>,
    pub sample_rows: ConfigValue<usize>,
    pub download_dir: ConfigValue<PathBuf>,
    pub default_format: ConfigValue<OutputFormat>,
    pub event_buffer: ConfigValue<usize>,
    pub presets_file: ConfigValue<Option<PathBuf>>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            size_threshold_mb: ConfigValue::new(DEFAULT_SIZE_THRESHOLD_MB, ConfigSource::Default),
            sample_rows: ConfigValue::new(DEFAULT_SAMPLE_ROWS, ConfigSource::Default),
            download_dir: ConfigValue::new(PathBuf::from("downloads"), ConfigSource::Default),
            default_format: ConfigValue::new(OutputFormat::GeoParquet, ConfigSource::Default),
            event_buffer: ConfigValue::new(DEFAULT_EVENT_BUFFER, ConfigSource::Default),
            presets_file: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GpqError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GpqError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(threshold) = file_config.size_threshold_mb {
            self.size_threshold_mb.update(parse_threshold(threshold)?, ConfigSource::File);
        }
        if let Some(rows) = file_config.sample_rows {
            self.sample_rows.update(parse_positive("sample_rows", rows)?, ConfigSource::File);
        }
        if let Some(dir) = file_config.download_dir {
            self.download_dir.update(dir, ConfigSource::File);
        }
        if let Some(format) = file_config.default_format {
            self.default_format.update(OutputFormat::from_extension(&format)?, ConfigSource::File);
        }
        if let Some(buffer) = file_config.event_buffer {
            self.event_buffer.update(parse_positive("event_buffer", buffer)?, ConfigSource::File);
        }
        if let Some(presets) = file_config.presets_file {
            self.presets_file.update(Some(presets), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables. Invalid values are logged and skipped.
    pub fn load_from_env(mut self) -> Self {
        // GPQ_SIZE_THRESHOLD_MB
        if let Ok(value) = env::var("GPQ_SIZE_THRESHOLD_MB") {
            match value.parse::<f64>().ok().and_then(|v| parse_threshold(v).ok()) {
                Some(threshold) => {
                    self.size_threshold_mb.update(threshold, ConfigSource::Environment)
                }
                None => tracing::warn!(
                    "Invalid GPQ_SIZE_THRESHOLD_MB value '{}': expected a positive number",
                    value
                ),
            }
        }

        // GPQ_SAMPLE_ROWS
        if let Ok(value) = env::var("GPQ_SAMPLE_ROWS") {
            match value.parse::<usize>() {
                Ok(rows) if rows > 0 => self.sample_rows.update(rows, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid GPQ_SAMPLE_ROWS value '{}': expected a positive integer",
                    value
                ),
            }
        }

        // GPQ_DOWNLOAD_DIR
        if let Ok(dir) = env::var("GPQ_DOWNLOAD_DIR") {
            self.download_dir.update(PathBuf::from(dir), ConfigSource::Environment);
        }

        // GPQ_DEFAULT_FORMAT
        if let Ok(value) = env::var("GPQ_DEFAULT_FORMAT") {
            match OutputFormat::from_extension(&value) {
                Ok(format) => self.default_format.update(format, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GPQ_DEFAULT_FORMAT value '{}': expected parquet, duckdb, gpkg, fgb, or geojson",
                    value
                ),
            }
        }

        // GPQ_EVENT_BUFFER
        if let Ok(value) = env::var("GPQ_EVENT_BUFFER") {
            match value.parse::<usize>() {
                Ok(buffer) if buffer > 0 => {
                    self.event_buffer.update(buffer, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid GPQ_EVENT_BUFFER value '{}': expected a positive integer",
                    value
                ),
            }
        }

        // GPQ_PRESETS_FILE
        if let Ok(path) = env::var("GPQ_PRESETS_FILE") {
            self.presets_file.update(Some(PathBuf::from(path)), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(threshold) = overrides.size_threshold_mb {
            self.size_threshold_mb.update(threshold, ConfigSource::Cli);
        }

        if let Some(dir) = overrides.download_dir {
            self.download_dir.update(dir, ConfigSource::Cli);
        }

        if let Some(format) = overrides.default_format {
            self.default_format.update(format, ConfigSource::Cli);
        }

        if let Some(presets) = overrides.presets_file {
            self.presets_file.update(Some(presets), ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "size_threshold_mb".to_string(),
            (format!("{}", self.size_threshold_mb.value), self.size_threshold_mb.source),
        );
        map.insert(
            "sample_rows".to_string(),
            (self.sample_rows.value.to_string(), self.sample_rows.source),
        );
        map.insert(
            "download_dir".to_string(),
            (self.download_dir.value.display().to_string(), self.download_dir.source),
        );
        map.insert(
            "default_format".to_string(),
            (self.default_format.value.extension().to_string(), self.default_format.source),
        );
        map.insert(
            "event_buffer".to_string(),
            (self.event_buffer.value.to_string(), self.event_buffer.source),
        );
        map.insert(
            "presets_file".to_string(),
            (
                self.presets_file
                    .value
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(bundled)".to_string()),
                self.presets_file.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    size_threshold_mb: Option<f64>,
    sample_rows: Option<usize>,
    download_dir: Option<PathBuf>,
    default_format: Option<String>,
    event_buffer: Option<usize>,
    presets_file: Option<PathBuf>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub size_threshold_mb: Option<f64>,
    pub download_dir: Option<PathBuf>,
    pub default_format: Option<OutputFormat>,
    pub presets_file: Option<PathBuf>,
}

fn parse_threshold(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GpqError::ConfigInvalid {
            key: "size_threshold_mb".to_string(),
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn parse_positive(key: &str, value: usize) -> Result<usize> {
    if value > 0 {
        Ok(value)
    } else {
        Err(GpqError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        })
    }
}
