//! Source schema and the inspection result built from it.

use serde::{Deserialize, Serialize};

/// Geometry column name assumed when nothing better is found
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geometry";

/// Conventional bbox column name
pub const DEFAULT_BBOX_COLUMN: &str = "bbox";

/// One column as reported by the engine's DESCRIBE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: data_type.into() }
    }

    /// Record type, e.g. `STRUCT(xmin DOUBLE, ...)`
    pub fn is_struct(&self) -> bool {
        self.data_type.to_uppercase().contains("STRUCT")
    }

    pub fn is_map(&self) -> bool {
        self.data_type.to_uppercase().contains("MAP")
    }

    /// List type, e.g. `VARCHAR[]`
    pub fn is_list(&self) -> bool {
        self.data_type.contains("[]")
    }

    /// Engine-native geometry or geography type
    pub fn is_geometry(&self) -> bool {
        let upper = self.data_type.to_uppercase();
        upper.contains("GEOMETRY") || upper.contains("GEOGRAPHY")
    }
}

/// Raw key/value pair from a parquet footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// How a dataset exposes geometry and bbox pruning.
///
/// A profile is a hint: the acquisition stage re-derives the bbox and
/// geometry columns from a live schema read and overrides it on conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    schema: Vec<Column>,
    bbox_column: Option<String>,
    geometry_column: String,
}

impl SourceProfile {
    /// Build a profile; `has_bbox` follows from `bbox_column` being present
    pub fn new(
        schema: Vec<Column>,
        geometry_column: impl Into<String>,
        bbox_column: Option<String>,
    ) -> Self {
        Self { schema, bbox_column, geometry_column: geometry_column.into() }
    }

    /// Best-effort profile when inspection could not complete
    pub fn fallback() -> Self {
        Self::new(Vec::new(), DEFAULT_GEOMETRY_COLUMN, None)
    }

    /// Profile asserted for catalog entries that skip inspection
    pub fn trusted_preset() -> Self {
        Self::new(Vec::new(), DEFAULT_GEOMETRY_COLUMN, Some(DEFAULT_BBOX_COLUMN.to_string()))
    }

    /// Same profile with a different geometry column hint
    pub fn with_geometry_column(mut self, column: impl Into<String>) -> Self {
        self.geometry_column = column.into();
        self
    }

    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    pub fn has_bbox(&self) -> bool {
        self.bbox_column.is_some()
    }

    pub fn bbox_column(&self) -> Option<&str> {
        self.bbox_column.as_deref()
    }

    pub fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_checks() {
        let bbox = Column::new("bbox", "STRUCT(xmin DOUBLE, ymin DOUBLE, xmax DOUBLE, ymax DOUBLE)");
        assert!(bbox.is_struct());
        assert!(!bbox.is_geometry());

        assert!(Column::new("tags", "VARCHAR[]").is_list());
        assert!(Column::new("props", "MAP(VARCHAR, VARCHAR)").is_map());
        assert!(Column::new("geom", "GEOMETRY").is_geometry());
        assert!(Column::new("g", "geography").is_geometry());
    }

    #[test]
    fn test_has_bbox_follows_column() {
        assert!(!SourceProfile::fallback().has_bbox());
        let preset = SourceProfile::trusted_preset();
        assert!(preset.has_bbox());
        assert_eq!(preset.bbox_column(), Some("bbox"));
        assert_eq!(preset.geometry_column(), "geometry");
    }
}
