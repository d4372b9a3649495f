//! DuckDB adapter against local parquet files.
//!
//! Extension loading needs network access, so these tests stick to what the
//! bundled engine does on its own.

#![cfg(feature = "duckdb")]

use gpq_core::models::{MaterializePlan, SamplePlan};
use gpq_core::ports::{EngineConnection, QueryEngine};
use gpq_engine::{DuckDbConfig, DuckDbEngine};
use tempfile::TempDir;

fn write_parquet(dir: &TempDir) -> String {
    let path = dir.path().join("points.parquet");
    let conn = duckdb::Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "COPY (SELECT i AS id, 'feature ' || i AS label, \
         {{'xmin': i::DOUBLE, 'ymin': i::DOUBLE, 'xmax': i::DOUBLE + 1, 'ymax': i::DOUBLE + 1}} AS bbox \
         FROM range(10) t(i)) TO '{}' (FORMAT 'parquet')",
        path.display()
    ))
    .unwrap();
    path.display().to_string()
}

#[test]
fn test_describe_local_parquet() {
    let dir = TempDir::new().unwrap();
    let url = write_parquet(&dir);
    let engine = DuckDbEngine::default();
    let mut conn = engine.connect(None).unwrap();

    let columns = conn.describe(&url).unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "label", "bbox"]);
    assert!(columns[2].is_struct());
}

#[test]
fn test_materialize_count_and_drop() {
    let dir = TempDir::new().unwrap();
    let url = write_parquet(&dir);
    let engine = DuckDbEngine::new(DuckDbConfig { threads: Some(2), memory_limit: None }).unwrap();
    let mut conn = engine.connect(None).unwrap();

    let plan = MaterializePlan {
        table: "download_data".to_string(),
        source_url: url.clone(),
        projection: vec!["*".to_string()],
        predicate: None,
        sql: format!(
            "CREATE TABLE download_data AS (SELECT * FROM read_parquet('{}') \
             WHERE \"bbox\".xmin BETWEEN 2 AND 5 AND \"bbox\".ymin BETWEEN 2 AND 5)",
            url
        ),
    };
    conn.materialize(&plan).unwrap();
    assert_eq!(conn.count_rows("download_data").unwrap(), 4);

    let sample = SamplePlan {
        table: "download_data".to_string(),
        sample_size: 100,
        geometry_column: "geometry".to_string(),
        property_columns: vec!["label".to_string()],
        sql: "SELECT AVG(LENGTH(label)) FROM (SELECT label FROM download_data LIMIT 100)".to_string(),
    };
    let avg = conn.average_feature_bytes(&sample).unwrap().unwrap();
    assert!((avg - 9.0).abs() < 1e-9);

    conn.drop_table("download_data").unwrap();
    assert!(conn.count_rows("download_data").is_err());
}

#[test]
fn test_key_value_metadata_without_geo_key() {
    let dir = TempDir::new().unwrap();
    let url = write_parquet(&dir);
    let engine = DuckDbEngine::default();
    let mut conn = engine.connect(None).unwrap();

    let metadata = conn.key_value_metadata(&url).unwrap();
    assert!(metadata.iter().all(|kv| kv.key != b"geo"));
}

#[test]
fn test_missing_source_is_engine_error() {
    let engine = DuckDbEngine::default();
    let mut conn = engine.connect(None).unwrap();
    let err = conn.describe("/definitely/not/here.parquet").unwrap_err();
    assert!(matches!(err, gpq_core::GpqError::Engine(_)));
}

#[test]
fn test_database_file_persists_after_commit() {
    let dir = TempDir::new().unwrap();
    let url = write_parquet(&dir);
    let db = dir.path().join("out.duckdb");
    let engine = DuckDbEngine::default();
    {
        let mut conn = engine.connect(Some(&db)).unwrap();
        conn.materialize(&MaterializePlan {
            table: "download_data".to_string(),
            source_url: url.clone(),
            projection: vec!["*".to_string()],
            predicate: None,
            sql: format!("CREATE TABLE download_data AS (SELECT * FROM read_parquet('{}'))", url),
        })
        .unwrap();
        conn.commit().unwrap();
    }

    let mut reopened = engine.connect(Some(&db)).unwrap();
    assert_eq!(reopened.count_rows("download_data").unwrap(), 10);
}
