//! Response cache metrics regression tests

use super::helpers::*;
use courier::cache::ResponseCache;
use courier::core::{HeaderMap, StatusCode, Url};
use courier::HttpResponse;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn cache_metrics_exist() {
    init_recorder();

    let cache = ResponseCache::builder()
        .name("metrics_cache")
        .ttl(Duration::from_secs(60))
        .build();
    let url = "http://example.test/item";

    assert!(cache.get(url).is_none());
    cache.insert(
        url,
        HttpResponse::new(StatusCode::OK, HeaderMap::new(), "", Url::parse(url).unwrap()),
    );
    assert!(cache.get(url).is_some());

    assert_counter_exists("courier_cache_requests_total");
    assert_metric_has_label("courier_cache_requests_total", "cache", "metrics_cache");
    assert_metric_has_label("courier_cache_requests_total", "result", "hit");
    assert_metric_has_label("courier_cache_requests_total", "result", "miss");
    assert_gauge_exists("courier_cache_size");
}
