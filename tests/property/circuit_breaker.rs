//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - The circuit opens exactly when consecutive failures reach the threshold
//! - Any success below the threshold resets the failure count
//! - An open circuit rejects every call until its reset timeout

use courier::circuitbreaker::CircuitBreaker;
use courier::CircuitState;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn opens_exactly_at_the_threshold(
        threshold in 1u32..=10,
        statuses in prop::collection::vec(prop::sample::select(vec![200u16, 204, 404, 500, 502, 503]), 1..60),
    ) {
        let breaker = CircuitBreaker::new(threshold, Duration::from_secs(3600));
        let mut consecutive = 0u32;
        let mut opened = false;

        for status in statuses {
            let admitted = breaker.try_acquire().is_ok();
            prop_assert_eq!(admitted, !opened);
            if !admitted {
                continue;
            }

            breaker.record_status(status);
            if status >= 500 {
                consecutive += 1;
            } else {
                consecutive = 0;
            }
            if consecutive >= threshold {
                opened = true;
            }

            let expected = if opened { CircuitState::Open } else { CircuitState::Closed };
            prop_assert_eq!(breaker.state(), expected);
            if !opened {
                prop_assert_eq!(breaker.failure_count(), consecutive);
            }
        }
    }
}
