//! gpq core - Domain models, configuration, and engine ports
//!
//! This crate holds what every other gpq crate agrees on: the source profile,
//! acquisition jobs, query plans, the preset catalog, and the traits the
//! query engine adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod presets;
pub mod sql;

pub use error::{GpqError, Result};
