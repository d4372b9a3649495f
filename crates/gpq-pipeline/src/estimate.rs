//! Output size estimate for verbose text formats

/// Bytes of `{"type":"FeatureCollection","features":[]}`
pub const COLLECTION_OVERHEAD_BYTES: f64 = 50.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Estimated bytes of a feature collection: every feature, the wrapper, and
/// one separator between consecutive features
pub fn estimate_bytes(rows: u64, average_feature_bytes: f64) -> f64 {
    if rows == 0 || !average_feature_bytes.is_finite() || average_feature_bytes <= 0.0 {
        return 0.0;
    }
    let rows = rows as f64;
    rows * average_feature_bytes + COLLECTION_OVERHEAD_BYTES + (rows - 1.0)
}

/// [`estimate_bytes`] in MB
pub fn estimate_megabytes(rows: u64, average_feature_bytes: f64) -> f64 {
    estimate_bytes(rows, average_feature_bytes) / BYTES_PER_MB
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thousand_rows() {
        let s = 512.0;
        let expected = (1000.0 * s + 50.0 + 999.0) / 1_048_576.0;
        assert!((estimate_megabytes(1000, s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_or_unknown_sample() {
        assert_eq!(estimate_megabytes(0, 300.0), 0.0);
        assert_eq!(estimate_megabytes(10, 0.0), 0.0);
        assert_eq!(estimate_megabytes(10, f64::NAN), 0.0);
    }

    #[test]
    fn test_threshold_scale() {
        // 10M features of ~500 bytes is well past 4 GB
        assert!(estimate_megabytes(10_000_000, 500.0) > 4096.0);
        assert!(estimate_megabytes(1_000, 500.0) < 1.0);
    }

    proptest! {
        #[test]
        fn monotonic_in_rows(rows in 1u64..10_000_000, extra in 1u64..1_000, s in 1.0f64..10_000.0) {
            prop_assert!(estimate_megabytes(rows + extra, s) > estimate_megabytes(rows, s));
        }

        #[test]
        fn monotonic_in_feature_size(rows in 1u64..10_000_000, s in 1.0f64..10_000.0, extra in 0.5f64..1_000.0) {
            prop_assert!(estimate_megabytes(rows, s + extra) > estimate_megabytes(rows, s));
        }
    }
}
