//! Connection pool metrics regression tests

use super::helpers::*;
use courier::pool::{ConnectionPool, PoolConfig};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn pool_metrics_exist() {
    init_recorder();

    let pool = ConnectionPool::builder()
        .config(PoolConfig::builder().max_idle_per_host(10).build().unwrap())
        .name("metrics_pool")
        .build()
        .unwrap();

    let guards: Vec<_> = (0..9).map(|_| pool.track()).collect();
    pool.record_request(true, Duration::from_millis(5));
    pool.adjust_now();
    drop(guards);

    assert_gauge_exists("courier_pool_max_idle_per_host");
    assert_metric_has_label("courier_pool_max_idle_per_host", "pool", "metrics_pool");
    assert_gauge_exists("courier_pool_active_connections");
    assert_counter_exists("courier_pool_requests_total");
    assert_metric_has_label("courier_pool_requests_total", "outcome", "success");
    assert_counter_exists("courier_pool_adjustments_total");
}
