//! Circuit breaker metrics regression tests

use super::helpers::*;
use courier::circuitbreaker::CircuitBreaker;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn circuitbreaker_metrics_exist() {
    init_recorder();

    let breaker = CircuitBreaker::builder()
        .name("metrics_breaker")
        .failure_threshold(1)
        .reset_timeout(Duration::from_secs(60))
        .build();

    breaker.try_acquire().unwrap();
    breaker.record_status(503);
    assert!(breaker.try_acquire().is_err());

    assert_counter_exists("courier_circuitbreaker_calls_total");
    assert_metric_has_label("courier_circuitbreaker_calls_total", "outcome", "failure");
    assert_metric_has_label("courier_circuitbreaker_calls_total", "outcome", "rejected");
    assert_counter_exists("courier_circuitbreaker_transitions_total");
    assert_metric_has_label("courier_circuitbreaker_transitions_total", "to", "Open");
    assert_gauge_exists("courier_circuitbreaker_state");
    assert_metric_has_label("courier_circuitbreaker_state", "circuitbreaker", "metrics_breaker");
}
