//! Command implementations

mod config;
mod download;
mod inspect;
mod presets;

use crate::cli::{Cli, Commands};
use crate::config_loader;
use crate::output::OutputWriter;
use anyhow::Result;
use gpq_core::config::{CliConfigOverrides, LayeredConfig};
use gpq_engine::DuckDbEngine;
use gpq_pipeline::{JobRunner, WorkerSettings};
use std::sync::Arc;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let mut overrides = CliConfigOverrides {
        presets_file: cli.presets_file.clone(),
        ..Default::default()
    };
    if let Commands::Download(args) = &cli.command {
        overrides.size_threshold_mb = args.size_threshold_mb;
        overrides.download_dir = args.output_dir.clone();
    }
    let config = config_loader::load_config(cli.config.as_deref(), overrides)?;

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args, &config, &output).await,
        Commands::Download(args) => download::execute(args, &config, &output, cli.dry_run).await,
        Commands::Presets(args) => presets::execute(args, &config, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Job runner on the embedded DuckDB engine
pub(crate) fn runner(config: &LayeredConfig) -> Result<JobRunner<DuckDbEngine>> {
    let engine = DuckDbEngine::from_env()?;
    let catalog = config_loader::load_catalog(config)?;
    Ok(JobRunner::new(
        engine,
        Arc::new(catalog),
        WorkerSettings::from(config),
        config.event_buffer.value,
    ))
}
