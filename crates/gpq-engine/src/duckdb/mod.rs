//! DuckDB engine adapter

pub mod config;

pub use config::{ConfigError, DuckDbConfig};

use ::duckdb::Connection;
use gpq_core::error::{GpqError, Result};
use gpq_core::models::{Column, ExportPlan, KeyValue, MaterializePlan, SamplePlan};
use gpq_core::ports::{EngineConnection, Extension, QueryEngine};
use gpq_core::sql::{quote_identifier, quote_literal};
use std::path::Path;

/// Embedded DuckDB engine
#[derive(Debug, Clone, Default)]
pub struct DuckDbEngine {
    config: DuckDbConfig,
}

impl DuckDbEngine {
    /// Create an engine with the given configuration
    pub fn new(config: DuckDbConfig) -> Result<Self> {
        config.validate().map_err(|e| match e {
            ConfigError::Invalid { key, reason } => GpqError::ConfigInvalid { key, reason },
        })?;
        Ok(Self { config })
    }

    /// Create an engine configured from the environment
    pub fn from_env() -> Result<Self> {
        let config = DuckDbConfig::from_env().map_err(|e| match e {
            ConfigError::Invalid { key, reason } => GpqError::ConfigInvalid { key, reason },
        })?;
        Self::new(config)
    }

    pub fn config(&self) -> &DuckDbConfig {
        &self.config
    }
}

impl QueryEngine for DuckDbEngine {
    type Connection = DuckDbConnection;

    fn connect(&self, database: Option<&Path>) -> Result<DuckDbConnection> {
        let conn = match database {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| GpqError::engine(format!("Failed to open database: {}", e)))?;

        for statement in self.config.session_statements() {
            conn.execute_batch(&statement).map_err(GpqError::engine)?;
        }

        tracing::debug!(
            "Opened DuckDB connection ({})",
            database.map(|p| p.display().to_string()).unwrap_or_else(|| "in-memory".to_string())
        );
        Ok(DuckDbConnection { conn })
    }
}

/// One DuckDB connection, exclusively owned by a job
pub struct DuckDbConnection {
    conn: Connection,
}

impl DuckDbConnection {
    fn execute(&self, sql: &str) -> Result<()> {
        tracing::trace!("Executing: {}", sql);
        self.conn.execute_batch(sql).map_err(GpqError::engine)
    }
}

impl EngineConnection for DuckDbConnection {
    fn load_extensions(&mut self, extensions: &[Extension]) -> Result<()> {
        for extension in extensions {
            self.execute(&format!("INSTALL {0}; LOAD {0};", extension.name()))?;
        }
        Ok(())
    }

    fn describe(&mut self, url: &str) -> Result<Vec<Column>> {
        let sql = format!("DESCRIBE SELECT * FROM read_parquet({})", quote_literal(url));
        let mut stmt = self.conn.prepare(&sql).map_err(GpqError::engine)?;
        let rows = stmt
            .query_map([], |row| Ok(Column::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(GpqError::engine)?;

        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(GpqError::engine)
    }

    fn key_value_metadata(&mut self, url: &str) -> Result<Vec<KeyValue>> {
        let sql = format!("SELECT key, value FROM parquet_kv_metadata({})", quote_literal(url));
        let mut stmt = self.conn.prepare(&sql).map_err(GpqError::engine)?;
        let rows = stmt
            .query_map([], |row| Ok(KeyValue::new(row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)))
            .map_err(GpqError::engine)?;

        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(GpqError::engine)
    }

    fn materialize(&mut self, plan: &MaterializePlan) -> Result<()> {
        self.execute(&plan.sql)
    }

    fn count_rows(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0)).map_err(GpqError::engine)?;
        Ok(count.max(0) as u64)
    }

    fn average_feature_bytes(&mut self, plan: &SamplePlan) -> Result<Option<f64>> {
        self.conn
            .query_row(&plan.sql, [], |row| row.get::<_, Option<f64>>(0))
            .map_err(GpqError::engine)
    }

    fn export(&mut self, plan: &ExportPlan) -> Result<()> {
        self.execute(&plan.sql)
    }

    fn commit(&mut self) -> Result<()> {
        self.execute("CHECKPOINT")
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        self.execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)))
    }
}
