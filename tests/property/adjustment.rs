//! Property tests for the idle-ceiling adjustment rule.
//!
//! Invariants tested:
//! - Utilization inside the hysteresis band never changes the ceiling
//! - Growth only happens above the scale-up threshold and respects the cap
//! - Shrinking only happens below the scale-down threshold and respects the floor
//! - An idle pool is never resized

use courier::pool::{plan_adjustment, Adjustment, PoolConfig};
use proptest::prelude::*;

prop_compose! {
    fn valid_config()(
        max_idle in 1usize..=200,
        down in 0.0f64..0.5,
        gap in 0.05f64..0.5,
        cap_extra in 0usize..=300,
        unlimited in any::<bool>(),
    )(
        min in 0usize..=max_idle,
        max_idle in Just(max_idle),
        down in Just(down),
        up in Just((down + gap).min(1.0)),
        cap in Just(if unlimited { 0 } else { max_idle + cap_extra }),
    ) -> PoolConfig {
        PoolConfig::builder()
            .max_idle_per_host(max_idle)
            .min_per_host(min)
            .max_conns_per_host(cap)
            .thresholds(down, up)
            .build()
            .unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn decisions_respect_thresholds_and_bounds(
        config in valid_config(),
        active in 0usize..=400,
    ) {
        let decision = plan_adjustment(&config, active);
        let utilization = active as f64 / config.max_idle_per_host as f64;

        match decision {
            Adjustment::Hold => {}
            Adjustment::Grow { from, to, .. } => {
                prop_assert!(utilization > config.scale_up_threshold);
                prop_assert_eq!(from, config.max_idle_per_host);
                prop_assert!(to > from);
                if config.max_conns_per_host != 0 {
                    prop_assert!(to <= config.max_conns_per_host);
                }
            }
            Adjustment::Shrink { from, to, .. } => {
                prop_assert!(utilization < config.scale_down_threshold);
                prop_assert_eq!(from, config.max_idle_per_host);
                prop_assert!(to < from);
                prop_assert!(to >= config.min_per_host);
            }
            Adjustment::Rejected { proposed, .. } => {
                let above_cap = config.max_conns_per_host != 0
                    && proposed > config.max_conns_per_host;
                prop_assert!(above_cap || proposed < config.min_per_host);
            }
        }

        if active > 0
            && utilization >= config.scale_down_threshold
            && utilization <= config.scale_up_threshold
        {
            prop_assert_eq!(decision, Adjustment::Hold);
        }
    }

    #[test]
    fn idle_pools_are_left_alone(config in valid_config()) {
        prop_assert_eq!(plan_adjustment(&config, 0), Adjustment::Hold);
    }

    #[test]
    fn growth_is_half_again_rounded(current in 2usize..=1000) {
        let config = PoolConfig::builder()
            .max_idle_per_host(current)
            .min_per_host(0)
            .max_conns_per_host(0)
            .build()
            .unwrap();

        match plan_adjustment(&config, current) {
            Adjustment::Grow { to, .. } => {
                prop_assert_eq!(to, (current as f64 * 1.5).round() as usize);
            }
            other => prop_assert!(false, "expected growth, got {:?}", other),
        }
    }
}
