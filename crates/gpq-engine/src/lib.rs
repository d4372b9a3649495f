//! gpq engine - Query engine adapters
//!
//! Implementations of the engine ports from `gpq-core`: DuckDB for real
//! work and an in-memory engine that evaluates plans structurally.

pub mod memory;

#[cfg(feature = "duckdb")]
pub mod duckdb;

pub use memory::{MemoryDataset, MemoryEngine};

#[cfg(feature = "duckdb")]
pub use crate::duckdb::{DuckDbConfig, DuckDbEngine};
