//! Property tests for retry backoff.
//!
//! Invariants tested:
//! - Exponential intervals never shrink and never exceed their cap
//! - Jittered intervals stay within the randomization band
//! - The retry middleware never asks for more attempts than its budget

use courier::retry::{
    ExponentialBackoff, ExponentialRandomBackoff, IntervalFunction, RetryMiddleware,
};
use courier::{HttpError, Method, Middleware, RequestContext};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn exponential_is_monotonic_and_capped(
        initial_ms in 1u64..=1_000,
        multiplier in 1.0f64..=4.0,
        cap_ms in 1u64..=60_000,
    ) {
        let cap = Duration::from_millis(cap_ms);
        let backoff = ExponentialBackoff::new(Duration::from_millis(initial_ms))
            .multiplier(multiplier)
            .max_interval(cap);

        let mut previous = Duration::ZERO;
        for retry in 0..40 {
            let interval = backoff.next_interval(retry);
            prop_assert!(interval >= previous);
            prop_assert!(interval <= cap);
            previous = interval;
        }
    }

    #[test]
    fn jitter_stays_in_band(
        initial_ms in 10u64..=1_000,
        factor in 0.0f64..=1.0,
        retry in 0usize..6,
    ) {
        let base = ExponentialBackoff::new(Duration::from_millis(initial_ms))
            .next_interval(retry)
            .as_secs_f64();
        let jittered = ExponentialRandomBackoff::new(Duration::from_millis(initial_ms), factor)
            .next_interval(retry)
            .as_secs_f64();

        let slack = 1e-6;
        prop_assert!(jittered >= base * (1.0 - factor) - slack);
        prop_assert!(jittered <= base * (1.0 + factor) + slack);
    }

    #[test]
    fn retry_budget_is_never_exceeded(max_attempts in 1u32..=10) {
        let retry = RetryMiddleware::builder()
            .max_attempts(max_attempts)
            .fixed_backoff(Duration::ZERO)
            .build();
        let ctx = RequestContext::new(
            Method::GET,
            "http://example.test/".parse().unwrap(),
            1,
        );
        let error = HttpError::network("connection reset");

        let mut attempt = 1;
        while retry.retry_after(attempt, Err(&error), &ctx).is_some() {
            attempt += 1;
            prop_assert!(attempt <= max_attempts);
        }
        prop_assert_eq!(attempt, max_attempts);
    }
}
