//! Property tests for pool configuration validation.
//!
//! Invariants tested:
//! - Thresholds outside 0.0..=1.0 are rejected
//! - Inverted or equal thresholds are rejected
//! - A floor above the idle ceiling is rejected

use courier::pool::{PoolConfig, PoolConfigError};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn out_of_range_thresholds_are_rejected(up in 1.0001f64..10.0) {
        let err = PoolConfig::builder().thresholds(0.1, up).build().unwrap_err();
        let is_out_of_range = matches!(err, PoolConfigError::ThresholdOutOfRange { .. });
        prop_assert!(is_out_of_range);
    }

    #[test]
    fn inverted_thresholds_are_rejected(down in 0.0f64..=1.0, below in 0.0f64..=1.0) {
        let up = down * below;
        let err = PoolConfig::builder().thresholds(down, up).build().unwrap_err();
        let is_inverted = matches!(err, PoolConfigError::InvertedThresholds { .. });
        prop_assert!(is_inverted);
    }

    #[test]
    fn floor_must_not_exceed_ceiling(max_idle in 0usize..100, extra in 1usize..100) {
        let err = PoolConfig::builder()
            .max_idle_per_host(max_idle)
            .min_per_host(max_idle + extra)
            .build()
            .unwrap_err();
        prop_assert_eq!(
            err,
            PoolConfigError::MinAboveMax { min: max_idle + extra, max: max_idle }
        );
    }
}
