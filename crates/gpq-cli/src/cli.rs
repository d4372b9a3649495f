use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gpq - Download area-of-interest subsets of GeoParquet datasets
#[derive(Parser, Debug)]
#[command(name = "gpq")]
#[command(about = "Download area-of-interest subsets of GeoParquet datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned queries without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./gpq.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Preset catalog file replacing the bundled one
    #[arg(long, global = true, value_name = "PATH")]
    pub presets_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect a dataset's geometry and bbox columns
    Inspect(InspectArgs),

    /// Download one or more datasets clipped to a bounding box
    Download(DownloadArgs),

    /// List the preset dataset catalog
    Presets(PresetsArgs),

    /// Show effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Dataset locator (http(s)://, s3://, file://, hf://)
    pub url: String,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Dataset locators, downloaded in order
    #[arg(required_unless_present = "preset")]
    pub urls: Vec<String>,

    /// Preset dataset as SOURCE/KEY (e.g., overture/places)
    #[arg(long, value_name = "SOURCE/KEY", conflicts_with = "urls")]
    pub preset: Option<String>,

    /// Subtypes for templated presets (e.g., land_use for overture/base)
    #[arg(long, value_delimiter = ',')]
    pub subtype: Vec<String>,

    /// Area of interest as xmin,ymin,xmax,ymax (omit to download everything)
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// EPSG code of the bbox coordinates
    #[arg(long, default_value = "4326")]
    pub crs: u32,

    /// Output file; the extension selects the format (single source only)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Directory for generated file names
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output extension for generated file names (parquet, duckdb, gpkg, fgb, geojson)
    #[arg(long)]
    pub format: Option<String>,

    /// Warn above this estimated size (MB) for GeoJSON output
    #[arg(long)]
    pub size_threshold_mb: Option<f64>,

    /// Answer yes to the bbox and size warnings
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct PresetsArgs {
    /// Only list one source (e.g., overture)
    #[arg(long)]
    pub source: Option<String>,
}
