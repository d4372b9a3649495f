//! Port trait definitions
//!
//! The pipeline talks to the embedded query engine only through these traits.
//! Calls are blocking; jobs run them off the caller's event loop.

use std::path::Path;

use crate::error::Result;
use crate::models::{Column, ExportPlan, KeyValue, MaterializePlan, SamplePlan};

/// Engine capability loaded on every new connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    /// Remote filesystems: http(s), s3, hf
    Httpfs,
    /// Geometry types, ST_* functions and the GDAL writer
    Spatial,
    /// JSON construction used by the size estimator
    Json,
}

impl Extension {
    pub fn name(&self) -> &'static str {
        match self {
            Extension::Httpfs => "httpfs",
            Extension::Spatial => "spatial",
            Extension::Json => "json",
        }
    }
}

/// Extensions the inspector and worker need
pub const REQUIRED_EXTENSIONS: [Extension; 2] = [Extension::Httpfs, Extension::Spatial];

/// Factory for engine connections. Each job owns its own connection.
pub trait QueryEngine: Send + Sync {
    type Connection: EngineConnection;

    /// Open a connection; `database` persists tables to that file
    fn connect(&self, database: Option<&Path>) -> Result<Self::Connection>;
}

/// Port for one exclusive engine connection
pub trait EngineConnection: Send {
    /// Install and load engine extensions
    fn load_extensions(&mut self, extensions: &[Extension]) -> Result<()>;

    /// Ordered column schema of a source
    fn describe(&mut self, url: &str) -> Result<Vec<Column>>;

    /// Key/value metadata embedded in the source footer
    fn key_value_metadata(&mut self, url: &str) -> Result<Vec<KeyValue>>;

    /// Create the intermediate table
    fn materialize(&mut self, plan: &MaterializePlan) -> Result<()>;

    /// Row count of a table
    fn count_rows(&mut self, table: &str) -> Result<u64>;

    /// Average serialized feature length in bytes, `None` for an empty sample
    fn average_feature_bytes(&mut self, plan: &SamplePlan) -> Result<Option<f64>>;

    /// Write the intermediate table to its destination file
    fn export(&mut self, plan: &ExportPlan) -> Result<()>;

    /// Make database output durable
    fn commit(&mut self) -> Result<()>;

    /// Drop a table if it exists
    fn drop_table(&mut self, table: &str) -> Result<()>;
}
