//! Retry metrics regression tests

use super::helpers::*;
use courier::retry::RetryMiddleware;
use courier::{HttpError, Method, Middleware, RequestContext};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn retry_metrics_exist() {
    init_recorder();

    let retry = RetryMiddleware::builder()
        .name("metrics_retry")
        .max_attempts(2)
        .fixed_backoff(Duration::ZERO)
        .build();
    let ctx = RequestContext::new(Method::GET, "http://example.test/".parse().unwrap(), 1);
    let error = HttpError::network("connection reset");

    assert!(retry.retry_after(1, Err(&error), &ctx).is_some());
    assert!(retry.retry_after(2, Err(&error), &ctx).is_none());

    assert_counter_exists("courier_retry_attempts_total");
    assert_metric_has_label("courier_retry_attempts_total", "retry", "metrics_retry");
    assert_counter_exists("courier_retry_exhausted_total");
}
