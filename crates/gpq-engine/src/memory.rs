//! In-memory query engine for development and testing.
//!
//! Sources are registered up front with a schema, footer metadata and
//! feature geometries. Plans are evaluated from their structured parts, the
//! SQL text is only recorded.

use geo::{BoundingRect, Geometry, Intersects, Point};
use gpq_core::error::{GpqError, Result};
use gpq_core::models::{Column, ExportPlan, KeyValue, MaterializePlan, Predicate, SamplePlan};
use gpq_core::ports::{EngineConnection, Extension, QueryEngine};
use gpq_geo::bbox_polygon;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Callback invoked with the operation name before each connection call
pub type OperationHook = Arc<dyn Fn(&str) + Send + Sync>;

/// A registered source
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    columns: Vec<Column>,
    metadata: Vec<KeyValue>,
    features: Vec<Geometry<f64>>,
    feature_bytes: f64,
    failure: Option<String>,
}

impl MemoryDataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns, feature_bytes: 200.0, ..Default::default() }
    }

    /// Add a footer key/value pair
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push(KeyValue::new(key.as_bytes(), value.as_bytes()));
        self
    }

    pub fn with_feature(mut self, geometry: impl Into<Geometry<f64>>) -> Self {
        self.features.push(geometry.into());
        self
    }

    pub fn with_points(mut self, points: &[(f64, f64)]) -> Self {
        self.features.extend(points.iter().map(|&(x, y)| Geometry::Point(Point::new(x, y))));
        self
    }

    /// Serialized size reported for every sampled feature
    pub fn with_feature_bytes(mut self, bytes: f64) -> Self {
        self.feature_bytes = bytes;
        self
    }

    /// Every read of this source fails with the given engine text
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(GpqError::Engine(message.clone())),
            None => Ok(()),
        }
    }

    fn matching_rows(&self, predicate: Option<&Predicate>) -> u64 {
        self.features.iter().filter(|feature| feature_matches(feature, predicate)).count() as u64
    }
}

fn feature_matches(feature: &Geometry<f64>, predicate: Option<&Predicate>) -> bool {
    match predicate {
        None => true,
        Some(Predicate::BboxRange { bbox, .. }) => match feature.bounding_rect() {
            Some(rect) => {
                let min = rect.min();
                min.x >= bbox.xmin && min.x <= bbox.xmax && min.y >= bbox.ymin && min.y <= bbox.ymax
            }
            None => false,
        },
        Some(Predicate::Intersects { bbox, .. }) => feature.intersects(&bbox_polygon(bbox)),
    }
}

/// Observable side effects, for assertions
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    pub connections: Vec<Option<PathBuf>>,
    pub extensions: Vec<Extension>,
    pub statements: Vec<String>,
    pub exports: Vec<PathBuf>,
    pub commits: usize,
    pub dropped: Vec<String>,
}

#[derive(Default)]
struct MemoryState {
    datasets: HashMap<String, MemoryDataset>,
    log: MemoryLog,
}

/// In-memory implementation of QueryEngine
#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<RwLock<MemoryState>>,
    hook: Option<OperationHook>,
    export_failure: Option<String>,
}

impl MemoryEngine {
    /// Create an engine with no registered sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its locator
    pub fn register(&self, url: impl Into<String>, dataset: MemoryDataset) {
        self.state.write().unwrap().datasets.insert(url.into(), dataset);
    }

    pub fn with_dataset(self, url: impl Into<String>, dataset: MemoryDataset) -> Self {
        self.register(url, dataset);
        self
    }

    /// Run `hook` before every connection operation
    pub fn with_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Make every export fail with the given engine text
    pub fn with_export_failure(mut self, message: impl Into<String>) -> Self {
        self.export_failure = Some(message.into());
        self
    }

    /// Snapshot of everything the engine has been asked to do
    pub fn log(&self) -> MemoryLog {
        self.state.read().unwrap().log.clone()
    }
}

impl QueryEngine for MemoryEngine {
    type Connection = MemoryConnection;

    fn connect(&self, database: Option<&Path>) -> Result<MemoryConnection> {
        self.state.write().unwrap().log.connections.push(database.map(Path::to_path_buf));
        Ok(MemoryConnection {
            state: Arc::clone(&self.state),
            hook: self.hook.clone(),
            export_failure: self.export_failure.clone(),
            tables: HashMap::new(),
        })
    }
}

/// Intermediate table: the source it came from and its row count
#[derive(Debug, Clone)]
struct MemoryTable {
    source_url: String,
    rows: u64,
}

/// One connection to the in-memory engine
pub struct MemoryConnection {
    state: Arc<RwLock<MemoryState>>,
    hook: Option<OperationHook>,
    export_failure: Option<String>,
    tables: HashMap<String, MemoryTable>,
}

impl MemoryConnection {
    fn enter(&self, operation: &str) {
        if let Some(hook) = &self.hook {
            hook(operation);
        }
    }

    fn record(&self, statement: impl Into<String>) {
        self.state.write().unwrap().log.statements.push(statement.into());
    }

    fn dataset(&self, url: &str) -> Result<MemoryDataset> {
        let state = self.state.read().unwrap();
        let dataset = state.datasets.get(url).cloned().ok_or_else(|| {
            GpqError::Engine(format!("IO Error: No files found that match the pattern \"{}\"", url))
        })?;
        dataset.check_failure()?;
        Ok(dataset)
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables.get(name).ok_or_else(|| {
            GpqError::Engine(format!("Catalog Error: Table with name {} does not exist!", name))
        })
    }
}

impl EngineConnection for MemoryConnection {
    fn load_extensions(&mut self, extensions: &[Extension]) -> Result<()> {
        self.enter("load_extensions");
        self.state.write().unwrap().log.extensions.extend_from_slice(extensions);
        Ok(())
    }

    fn describe(&mut self, url: &str) -> Result<Vec<Column>> {
        self.enter("describe");
        self.record(format!("DESCRIBE SELECT * FROM read_parquet('{}')", url));
        Ok(self.dataset(url)?.columns)
    }

    fn key_value_metadata(&mut self, url: &str) -> Result<Vec<KeyValue>> {
        self.enter("key_value_metadata");
        self.record(format!("SELECT key, value FROM parquet_kv_metadata('{}')", url));
        Ok(self.dataset(url)?.metadata)
    }

    fn materialize(&mut self, plan: &MaterializePlan) -> Result<()> {
        self.enter("materialize");
        self.record(plan.sql.clone());
        let dataset = self.dataset(&plan.source_url)?;
        let rows = dataset.matching_rows(plan.predicate.as_ref());
        self.tables.insert(
            plan.table.clone(),
            MemoryTable { source_url: plan.source_url.clone(), rows },
        );
        Ok(())
    }

    fn count_rows(&mut self, table: &str) -> Result<u64> {
        self.enter("count_rows");
        self.record(format!("SELECT COUNT(*) FROM \"{}\"", table));
        Ok(self.table(table)?.rows)
    }

    fn average_feature_bytes(&mut self, plan: &SamplePlan) -> Result<Option<f64>> {
        self.enter("average_feature_bytes");
        self.record(plan.sql.clone());
        let table = self.table(&plan.table)?.clone();
        if table.rows == 0 || plan.sample_size == 0 {
            return Ok(None);
        }
        Ok(Some(self.dataset(&table.source_url)?.feature_bytes))
    }

    fn export(&mut self, plan: &ExportPlan) -> Result<()> {
        self.enter("export");
        self.record(plan.sql.clone());
        self.table(&plan.table)?;
        if let Some(message) = &self.export_failure {
            return Err(GpqError::Engine(message.clone()));
        }
        self.state.write().unwrap().log.exports.push(plan.destination.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.enter("commit");
        self.state.write().unwrap().log.commits += 1;
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.enter("drop_table");
        self.record(format!("DROP TABLE IF EXISTS \"{}\"", table));
        self.tables.remove(table);
        self.state.write().unwrap().log.dropped.push(table.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use gpq_core::models::BoundingBox;

    fn plan(url: &str, predicate: Option<Predicate>) -> MaterializePlan {
        MaterializePlan {
            table: "download_data".to_string(),
            source_url: url.to_string(),
            projection: vec!["*".to_string()],
            predicate,
            sql: "CREATE TABLE download_data AS (...)".to_string(),
        }
    }

    fn engine() -> MemoryEngine {
        let square = Polygon::new(
            LineString::from(vec![(10.0, 10.0), (12.0, 10.0), (12.0, 12.0), (10.0, 12.0), (10.0, 10.0)]),
            vec![],
        );
        MemoryEngine::new().with_dataset(
            "https://x/data.parquet",
            MemoryDataset::new(vec![Column::new("geometry", "GEOMETRY")])
                .with_points(&[(0.5, 0.5), (5.0, 5.0)])
                .with_feature(square),
        )
    }

    #[test]
    fn test_materialize_without_predicate_keeps_all_rows() {
        let engine = engine();
        let mut conn = engine.connect(None).unwrap();
        conn.materialize(&plan("https://x/data.parquet", None)).unwrap();
        assert_eq!(conn.count_rows("download_data").unwrap(), 3);
    }

    #[test]
    fn test_intersects_uses_geometry() {
        let engine = engine();
        let mut conn = engine.connect(None).unwrap();
        // Overlaps the square but not its min corner
        let bbox = BoundingBox::new(11.0, 11.0, 13.0, 13.0).unwrap();

        conn.materialize(&plan(
            "https://x/data.parquet",
            Some(Predicate::Intersects { column: "geometry".to_string(), bbox }),
        ))
        .unwrap();
        assert_eq!(conn.count_rows("download_data").unwrap(), 1);

        conn.materialize(&plan(
            "https://x/data.parquet",
            Some(Predicate::BboxRange { column: "bbox".to_string(), bbox }),
        ))
        .unwrap();
        assert_eq!(conn.count_rows("download_data").unwrap(), 0);
    }

    #[test]
    fn test_unknown_source_is_engine_error() {
        let engine = MemoryEngine::new();
        let mut conn = engine.connect(None).unwrap();
        let err = conn.describe("https://nowhere/x.parquet").unwrap_err();
        assert!(matches!(err, GpqError::Engine(_)));
    }

    #[test]
    fn test_failing_dataset() {
        let engine = MemoryEngine::new().with_dataset(
            "s3://broken",
            MemoryDataset::new(vec![]).failing("HTTP Error: 403"),
        );
        let mut conn = engine.connect(None).unwrap();
        assert_eq!(conn.describe("s3://broken").unwrap_err().to_string(), "HTTP Error: 403");
    }

    #[test]
    fn test_log_records_side_effects() {
        let engine = engine();
        let mut conn = engine.connect(Some(Path::new("/tmp/out.duckdb"))).unwrap();
        conn.load_extensions(&[Extension::Httpfs, Extension::Spatial]).unwrap();
        conn.commit().unwrap();
        conn.drop_table("download_data").unwrap();

        let log = engine.log();
        assert_eq!(log.connections, vec![Some(PathBuf::from("/tmp/out.duckdb"))]);
        assert_eq!(log.extensions.len(), 2);
        assert_eq!(log.commits, 1);
        assert_eq!(log.dropped, vec!["download_data".to_string()]);
    }
}
