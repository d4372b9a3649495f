//! DuckDB configuration

use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Engine tuning applied to every new connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuckDbConfig {
    /// Worker threads per connection (None = engine default)
    pub threads: Option<usize>,
    /// Memory cap such as `4GB` (None = engine default)
    pub memory_limit: Option<String>,
}

impl DuckDbConfig {
    /// Load configuration from environment variables
    ///
    /// Reads GPQ_DUCKDB_THREADS and GPQ_DUCKDB_MEMORY_LIMIT. Both are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let threads = match std::env::var("GPQ_DUCKDB_THREADS") {
            Ok(value) => Some(value.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "GPQ_DUCKDB_THREADS".to_string(),
                reason: e.to_string(),
            })?),
            Err(_) => None,
        };
        let memory_limit = std::env::var("GPQ_DUCKDB_MEMORY_LIMIT").ok();

        let config = Self { threads, memory_limit };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid {
                key: "threads".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if let Some(limit) = &self.memory_limit {
            let limit = limit.trim();
            let valid = !limit.is_empty()
                && limit.starts_with(|c: char| c.is_ascii_digit())
                && limit.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == ' ');
            if !valid {
                return Err(ConfigError::Invalid {
                    key: "memory_limit".to_string(),
                    reason: format!("'{}' is not a size such as 4GB", limit),
                });
            }
        }

        Ok(())
    }

    /// SET statements run after opening a connection
    pub fn session_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(threads) = self.threads {
            statements.push(format!("SET threads = {}", threads));
        }
        if let Some(limit) = &self.memory_limit {
            statements.push(format!("SET memory_limit = '{}'", limit.trim()));
        }
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_session_statements() {
        let config = DuckDbConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.session_statements().is_empty());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = DuckDbConfig { threads: Some(0), memory_limit: None };
        match config.validate() {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "threads"),
            _ => panic!("Expected Invalid error"),
        }
    }

    #[test]
    fn test_memory_limit_shape() {
        let ok = DuckDbConfig { threads: Some(4), memory_limit: Some("4GB".to_string()) };
        assert!(ok.validate().is_ok());
        assert_eq!(
            ok.session_statements(),
            vec!["SET threads = 4".to_string(), "SET memory_limit = '4GB'".to_string()]
        );

        let bad = DuckDbConfig { threads: None, memory_limit: Some("4GB'; DROP".to_string()) };
        assert!(bad.validate().is_err());
    }
}
