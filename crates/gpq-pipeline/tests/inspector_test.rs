//! Source inspection against the in-memory engine

use gpq_core::models::{Column, JobId};
use gpq_core::presets::PresetCatalog;
use gpq_engine::{MemoryDataset, MemoryEngine};
use gpq_pipeline::{drain, EventKind, JobContext, ProgressSink, SourceInspector};
use std::sync::Arc;

const BBOX_STRUCT: &str = "STRUCT(xmin FLOAT, ymin FLOAT, xmax FLOAT, ymax FLOAT)";

const TRUSTED_CATALOG: &str = r#"{
    "overture": {
        "places": {
            "display_name": "Places",
            "url_template": "s3://overturemaps-us-west-2/release/2025-09-24.0/theme=places/type={subtype}/*",
            "needs_validation": false
        }
    }
}"#;

fn inspector(engine: MemoryEngine) -> SourceInspector<MemoryEngine> {
    SourceInspector::new(engine, Arc::new(PresetCatalog::empty()))
}

fn context() -> (JobContext, tokio::sync::mpsc::Receiver<gpq_pipeline::JobEvent>) {
    let (sink, rx) = ProgressSink::channel(64);
    (JobContext::new(JobId::new(), sink), rx)
}

fn warnings(events: &[gpq_pipeline::JobEvent]) -> usize {
    events.iter().filter(|e| e.kind == EventKind::NeedsBboxWarning).count()
}

#[test]
fn test_no_bbox_and_no_metadata_warns_once() {
    let engine = MemoryEngine::new().with_dataset(
        "https://x/data.parquet",
        MemoryDataset::new(vec![Column::new("id", "BIGINT"), Column::new("geometry", "GEOMETRY")]),
    );
    let (ctx, mut rx) = context();

    let inspection = inspector(engine).inspect("https://x/data.parquet", &ctx).unwrap();

    assert!(inspection.success);
    assert!(!inspection.profile.has_bbox());
    assert_eq!(inspection.profile.bbox_column(), None);
    assert_eq!(inspection.message, "Validation with no bbox column");

    let events = drain(&mut rx);
    assert_eq!(warnings(&events), 1);
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::Validated { success: true, .. })));
}

#[test]
fn test_bbox_struct_column_wins() {
    let engine = MemoryEngine::new().with_dataset(
        "s3://bucket/data.parquet",
        MemoryDataset::new(vec![
            Column::new("geometry", "GEOMETRY"),
            Column::new("bbox", BBOX_STRUCT),
            Column::new("extent", BBOX_STRUCT),
        ])
        .with_metadata(
            "geo",
            r#"{"primary_column":"geometry","columns":{"geometry":{"covering":{"bbox":{"xmin":["extent","xmin"]}}}}}"#,
        ),
    );
    let (ctx, mut rx) = context();

    let inspection = inspector(engine.clone()).inspect("s3://bucket/data.parquet", &ctx).unwrap();

    assert!(inspection.profile.has_bbox());
    assert_eq!(inspection.profile.bbox_column(), Some("bbox"));
    assert_eq!(warnings(&drain(&mut rx)), 0);
    // Metadata is never read once the schema answers
    assert!(!engine.log().statements.iter().any(|s| s.contains("parquet_kv_metadata")));
}

#[test]
fn test_covering_metadata_names_bbox_column() {
    let engine = MemoryEngine::new().with_dataset(
        "https://x/covered.parquet",
        MemoryDataset::new(vec![Column::new("geometry", "GEOMETRY"), Column::new("geometry_bbox", BBOX_STRUCT)])
            .with_metadata(
                "geo",
                r#"{"primary_column":"geometry","columns":{"geometry":{"covering":{"bbox":{"xmin":["geometry_bbox","xmin"],"ymin":["geometry_bbox","ymin"],"xmax":["geometry_bbox","xmax"],"ymax":["geometry_bbox","ymax"]}}}}}"#,
            ),
    );
    let (ctx, _rx) = context();

    let inspection = inspector(engine).inspect("https://x/covered.parquet", &ctx).unwrap();
    assert_eq!(inspection.profile.bbox_column(), Some("geometry_bbox"));
}

#[test]
fn test_geometry_typed_column_under_other_name() {
    let engine = MemoryEngine::new().with_dataset(
        "file:///data/parcels.parquet",
        MemoryDataset::new(vec![Column::new("parcel_id", "VARCHAR"), Column::new("shape", "GEOMETRY")]),
    );
    let (ctx, _rx) = context();

    let inspection = inspector(engine).inspect("file:///data/parcels.parquet", &ctx).unwrap();
    assert_eq!(inspection.profile.geometry_column(), "shape");
}

#[test]
fn test_trusted_preset_skips_engine() {
    let engine = MemoryEngine::new();
    let catalog = PresetCatalog::from_json(TRUSTED_CATALOG).unwrap();
    let inspector = SourceInspector::new(engine.clone(), Arc::new(catalog));
    let (ctx, mut rx) = context();

    let inspection = inspector
        .inspect("s3://overturemaps-us-west-2/release/2025-09-24.0/theme=places/type=place/*", &ctx)
        .unwrap();

    assert!(inspection.success);
    assert!(inspection.profile.has_bbox());
    assert_eq!(inspection.profile.bbox_column(), Some("bbox"));
    assert!(engine.log().connections.is_empty());

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(warnings(&events), 0);
}

#[test]
fn test_connection_failure_degrades_with_warning() {
    let engine = MemoryEngine::new().with_dataset(
        "https://x/forbidden.parquet",
        MemoryDataset::new(vec![]).failing("HTTP Error: HTTP GET error (HTTP 403)"),
    );
    let (ctx, mut rx) = context();

    let inspection = inspector(engine).inspect("https://x/forbidden.parquet", &ctx).unwrap();

    assert!(!inspection.success);
    assert!(inspection.message.starts_with("Error validating source: HTTP Error"));
    assert!(!inspection.profile.has_bbox());
    assert_eq!(inspection.profile.geometry_column(), "geometry");

    let events = drain(&mut rx);
    assert_eq!(warnings(&events), 1);
    assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::Validated { success: false, .. })));
}

#[test]
fn test_unrecognized_scheme_is_reported() {
    let (ctx, mut rx) = context();
    let inspection = inspector(MemoryEngine::new()).inspect("ftp://x/data.parquet", &ctx).unwrap();

    assert!(!inspection.success);
    assert!(inspection.message.contains("Invalid dataset locator"));
    assert_eq!(warnings(&drain(&mut rx)), 1);
}

#[test]
fn test_killed_inspection_emits_nothing_further() {
    let (ctx, mut rx) = context();
    let token = ctx.cancellation().clone();
    let engine = MemoryEngine::new()
        .with_dataset(
            "https://x/data.parquet",
            MemoryDataset::new(vec![Column::new("geometry", "GEOMETRY")]),
        )
        .with_hook(move |operation| {
            if operation == "describe" {
                token.cancel();
            }
        });

    let inspection = inspector(engine).inspect("https://x/data.parquet", &ctx);

    assert!(inspection.is_none());
    let events = drain(&mut rx);
    assert!(events.iter().all(|e| matches!(e.kind, EventKind::Progress(_))));
    assert_eq!(events.len(), 2);
}
