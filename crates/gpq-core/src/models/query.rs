//! Query plans handed to an engine. Each carries its structured parts and
//! the SQL built from them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::geometry::BoundingBox;
use super::output::{OutputFormat, WriterOptions};

/// Row filter applied while materializing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Range test on the bbox struct's `xmin`/`ymin` sub-fields
    BboxRange { column: String, bbox: BoundingBox },
    /// Geometric intersection with the polygon of the rectangle
    Intersects { column: String, bbox: BoundingBox },
}

impl Predicate {
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            Predicate::BboxRange { bbox, .. } | Predicate::Intersects { bbox, .. } => bbox,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::BboxRange { column, .. } | Predicate::Intersects { column, .. } => column,
        }
    }
}

/// Filter the source into an intermediate table
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializePlan {
    pub table: String,
    pub source_url: String,
    /// Rendered select-list items, `*` when the projection is untouched
    pub projection: Vec<String>,
    pub predicate: Option<Predicate>,
    pub sql: String,
}

/// Average serialized feature size over the first rows of the intermediate table
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    pub table: String,
    pub sample_size: usize,
    pub geometry_column: String,
    pub property_columns: Vec<String>,
    pub sql: String,
}

/// Copy the intermediate table to a file
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub table: String,
    pub destination: PathBuf,
    pub writer: WriterOptions,
    /// Geometry column rows are Hilbert-sorted on, if any
    pub hilbert_column: Option<String>,
    pub sql: String,
}

/// Everything needed to materialize and write one job's result
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub format: OutputFormat,
    pub materialize: MaterializePlan,
    /// Present only for verbose text formats
    pub sample: Option<SamplePlan>,
    /// Absent for database output, which commits instead
    pub export: Option<ExportPlan>,
}

impl QuerySpec {
    pub fn table(&self) -> &str {
        &self.materialize.table
    }
}
