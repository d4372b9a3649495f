//! Dataset locator checks. Only a prefix test, not URL parsing.

use crate::error::{GpqError, Result};

/// Schemes a dataset locator may start with
pub const RECOGNIZED_SCHEMES: [&str; 5] = ["http://", "https://", "s3://", "file://", "hf://"];

/// Reject locators that do not use a recognized scheme or carry
/// surrounding whitespace
pub fn validate_locator(url: &str) -> Result<()> {
    let padded = url.trim() != url;
    if !padded && RECOGNIZED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        Ok(())
    } else {
        Err(GpqError::InvalidLocator { url: url.to_string() })
    }
}

/// Last path segment without query string, used in log lines and labels
pub fn dataset_name(url: &str) -> &str {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.trim_end_matches('/').rsplit('/').next().unwrap_or(without_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_schemes() {
        assert!(validate_locator("https://data.source.coop/x.parquet").is_ok());
        assert!(validate_locator("s3://overturemaps-us-west-2/release/*").is_ok());
        assert!(validate_locator("hf://datasets/org/repo/file.parquet").is_ok());
        assert!(validate_locator("file:///tmp/x.parquet").is_ok());
        assert!(validate_locator("ftp://example.com/x.parquet").is_err());
        assert!(validate_locator("/tmp/x.parquet").is_err());
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        assert!(validate_locator(" https://data.source.coop/x.parquet").is_err());
        assert!(validate_locator("https://data.source.coop/x.parquet\n").is_err());
    }

    #[test]
    fn test_dataset_name() {
        assert_eq!(dataset_name("https://x/a/addresses.pq?token=1"), "addresses.pq");
        assert_eq!(dataset_name("s3://bucket/theme=places/type=place/"), "type=place");
    }
}
