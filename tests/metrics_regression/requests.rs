//! Request metrics regression tests

use super::helpers::*;
use courier::middleware::MetricsMiddleware;
use courier::Session;
use serial_test::serial;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
#[serial]
async fn request_metrics_exist() {
    init_recorder();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let session = Session::builder()
        .middleware(MetricsMiddleware::new())
        .build()
        .unwrap();
    session.execute(session.get(server.uri())).await.unwrap();
    let _ = session.execute(session.get("http://127.0.0.1:1/")).await;

    assert_counter_exists("courier_requests_total");
    assert_metric_has_label("courier_requests_total", "method", "GET");
    assert_metric_has_label("courier_requests_total", "status", "201");
    assert_histogram_exists("courier_request_duration_seconds");
    assert_gauge_exists("courier_requests_in_flight");
    assert_counter_exists("courier_request_failures_total");
    assert_metric_has_label("courier_request_failures_total", "kind", "network");
}
