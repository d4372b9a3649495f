//! Output targets and the writer options each format maps to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{GpqError, Result};

/// Supported output encodings, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    GeoParquet,
    DuckDb,
    GeoPackage,
    FlatGeobuf,
    GeoJson,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::GeoParquet,
        OutputFormat::DuckDb,
        OutputFormat::GeoPackage,
        OutputFormat::FlatGeobuf,
        OutputFormat::GeoJson,
    ];

    /// Look up a format by extension, case-insensitively and without the dot
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "parquet" => Ok(OutputFormat::GeoParquet),
            "duckdb" => Ok(OutputFormat::DuckDb),
            "gpkg" => Ok(OutputFormat::GeoPackage),
            "fgb" => Ok(OutputFormat::FlatGeobuf),
            "geojson" => Ok(OutputFormat::GeoJson),
            _ => Err(GpqError::UnsupportedFormat { extension: extension.to_string() }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::GeoParquet => "parquet",
            OutputFormat::DuckDb => "duckdb",
            OutputFormat::GeoPackage => "gpkg",
            OutputFormat::FlatGeobuf => "fgb",
            OutputFormat::GeoJson => "geojson",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutputFormat::GeoParquet => "GeoParquet",
            OutputFormat::DuckDb => "DuckDB Database",
            OutputFormat::GeoPackage => "GeoPackage",
            OutputFormat::FlatGeobuf => "FlatGeobuf",
            OutputFormat::GeoJson => "GeoJSON",
        }
    }

    /// The source's own columnar encoding; no projection rewrite needed
    pub fn is_native(&self) -> bool {
        matches!(self, OutputFormat::GeoParquet)
    }

    /// Output is a table inside a database file rather than an exported file
    pub fn is_database(&self) -> bool {
        matches!(self, OutputFormat::DuckDb)
    }

    /// Text formats that expand rows enough to need a size estimate
    pub fn is_verbose_text(&self) -> bool {
        matches!(self, OutputFormat::GeoJson)
    }

    /// Fixed writer options, or `None` when the data stays in the database
    pub fn writer_options(&self) -> Option<WriterOptions> {
        match self {
            OutputFormat::GeoParquet => {
                Some(WriterOptions::Parquet { codec: "ZSTD", level: 22 })
            }
            OutputFormat::DuckDb => None,
            OutputFormat::GeoPackage => {
                Some(WriterOptions::Gdal { driver: "GPKG", srs: "EPSG:4326" })
            }
            OutputFormat::FlatGeobuf => {
                Some(WriterOptions::Gdal { driver: "FlatGeobuf", srs: "EPSG:4326" })
            }
            OutputFormat::GeoJson => {
                Some(WriterOptions::Gdal { driver: "GeoJSON", srs: "EPSG:4326" })
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How the export step writes a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterOptions {
    /// Native columnar copy with a lossless codec
    Parquet { codec: &'static str, level: u8 },
    /// GIS vector driver with an output CRS
    Gdal { driver: &'static str, srs: &'static str },
}

impl WriterOptions {
    /// Options clause for `COPY ... TO`
    pub fn to_sql(&self) -> String {
        match self {
            WriterOptions::Parquet { codec, level } => {
                format!("(FORMAT 'parquet', COMPRESSION '{}', COMPRESSION_LEVEL {})", codec, level)
            }
            WriterOptions::Gdal { driver, srs } => {
                format!("(FORMAT GDAL, DRIVER '{}', SRS '{}')", driver, srs)
            }
        }
    }
}

/// Where a job writes its result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub path: PathBuf,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw extension, empty when the path has none
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Resolve the writer from the extension; unknown extensions are an error
    pub fn format(&self) -> Result<OutputFormat> {
        let extension = self.extension();
        if extension.is_empty() {
            return Err(GpqError::MissingExtension { path: self.path.clone() });
        }
        OutputFormat::from_extension(&extension)
    }
}
