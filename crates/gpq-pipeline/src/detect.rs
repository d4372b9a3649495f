//! Geometry and bbox column detection shared by inspection and acquisition

use gpq_core::models::{Column, KeyValue, SourceProfile, DEFAULT_BBOX_COLUMN, DEFAULT_GEOMETRY_COLUMN};
use serde_json::Value;

/// Column names treated as geometry when no column has a geometry type
pub const GEOMETRY_NAME_CANDIDATES: [&str; 3] = ["geom", "the_geom", "wkb_geometry"];

/// Footer key holding GeoParquet metadata
pub const GEO_METADATA_KEY: &[u8] = b"geo";

/// Geometry column: first geometry-typed column, then a conventional name,
/// else `geometry`
pub fn detect_geometry_column(schema: &[Column]) -> String {
    if let Some(column) = schema.iter().find(|c| c.is_geometry()) {
        return column.name.clone();
    }

    schema
        .iter()
        .find(|c| GEOMETRY_NAME_CANDIDATES.contains(&c.name.to_lowercase().as_str()))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| DEFAULT_GEOMETRY_COLUMN.to_string())
}

/// Top-level `bbox` column with a struct type
pub fn bbox_struct_column(schema: &[Column]) -> Option<&Column> {
    schema
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(DEFAULT_BBOX_COLUMN) && c.is_struct())
}

/// Bbox column named by the `geo` footer's covering block.
///
/// Looks under the given geometry column first, then under the metadata's
/// `primary_column`. Malformed metadata is logged and treated as absent.
pub fn covering_bbox_column(metadata: &[KeyValue], geometry_column: &str) -> Option<String> {
    let entry = metadata.iter().find(|kv| kv.key == GEO_METADATA_KEY)?;

    let geo: Value = match serde_json::from_slice(&entry.value) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Error parsing geo metadata: {}", e);
            return None;
        }
    };

    let columns = geo.get("columns")?;
    let primary = geo.get("primary_column").and_then(Value::as_str);

    std::iter::once(geometry_column)
        .chain(primary)
        .find_map(|name| {
            columns
                .get(name)?
                .pointer("/covering/bbox/xmin/0")?
                .as_str()
                .map(str::to_string)
        })
}

/// Derive a profile from a live schema read.
///
/// A bbox struct column in the schema wins over covering metadata. A
/// covering column is only trusted when the schema has it as a struct.
pub fn profile_from_schema(schema: Vec<Column>, metadata: &[KeyValue]) -> SourceProfile {
    let geometry_column = detect_geometry_column(&schema);

    let bbox_column = match bbox_struct_column(&schema) {
        Some(column) => Some(column.name.clone()),
        None => covering_bbox_column(metadata, &geometry_column).filter(|name| {
            let usable = schema.iter().any(|c| &c.name == name && c.is_struct());
            if !usable {
                tracing::warn!("Covering column '{}' is not a struct column in the schema", name);
            }
            usable
        }),
    };

    SourceProfile::new(schema, geometry_column, bbox_column)
}

/// Reconcile a profile hint with the live schema, returning the schema's truth
pub fn reconcile(hint: &SourceProfile, schema: Vec<Column>, metadata: &[KeyValue]) -> SourceProfile {
    let live = profile_from_schema(schema, metadata);

    if hint.bbox_column() != live.bbox_column() {
        tracing::info!(
            "Overriding bbox column {:?} with {:?} from live schema",
            hint.bbox_column(),
            live.bbox_column()
        );
    }
    if hint.geometry_column() != live.geometry_column() {
        tracing::info!(
            "Overriding geometry column '{}' with '{}' from live schema",
            hint.geometry_column(),
            live.geometry_column()
        );
    }

    live
}
