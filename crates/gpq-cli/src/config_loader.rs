//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use gpq_core::config::{CliConfigOverrides, LayeredConfig};
use gpq_core::presets::PresetCatalog;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gpq.toml";

/// Load layered configuration: defaults, file, environment, then CLI overrides
pub fn load_config(config_path: Option<&Path>, overrides: CliConfigOverrides) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file(config_path) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

/// Explicit path, else `gpq.toml` in the working directory if it exists
fn config_file(config_path: Option<&Path>) -> Option<PathBuf> {
    match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Preset catalog from the configured file, or the bundled one
pub fn load_catalog(config: &LayeredConfig) -> Result<PresetCatalog> {
    match &config.presets_file.value {
        Some(path) => PresetCatalog::load_from_file(path)
            .with_context(|| format!("Failed to load preset catalog {}", path.display())),
        None => PresetCatalog::bundled().context("Bundled preset catalog is invalid"),
    }
}
