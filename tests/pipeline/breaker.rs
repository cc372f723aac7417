//! Circuit breaking through a session.

use super::helpers::*;
use courier::middleware::{CircuitBreaker, MetricsMiddleware, ResponseCache};
use courier::{CircuitState, ErrorKind, Phase, Session};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn server_errors_open_the_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let breaker = CircuitBreaker::new(2, Duration::from_secs(3600));
    let session = Session::builder().middleware(breaker.clone()).build().unwrap();

    for _ in 0..2 {
        let response = session.execute(session.get(server.uri())).await.unwrap();
        assert_eq!(response.status(), 500);
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    let err = session.execute(session.get(server.uri())).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::CircuitOpen));
    assert_eq!(err.phase(), Some(Phase::BeforeRequest));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn transport_failures_count_as_failures() {
    let breaker = CircuitBreaker::new(2, Duration::from_secs(3600));
    let session = Session::builder().middleware(breaker.clone()).build().unwrap();

    for _ in 0..2 {
        let err = session.execute(session.get(UNREACHABLE)).await.unwrap_err();
        assert!(err.is_kind(ErrorKind::Network));
    }
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn successful_trial_closes_the_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
    let session = Session::builder().middleware(breaker.clone()).build().unwrap();

    breaker.force_open();
    let err = session.execute(session.get(server.uri())).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::CircuitOpen));

    tokio::time::sleep(Duration::from_millis(80)).await;
    let response = session.execute(session.get(server.uri())).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test]
async fn later_rejection_releases_the_trial_without_counting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let log = hook_log();
    let mut rejecting = Recorder::new("auth", &log);
    rejecting.fail_before = Some(courier::HttpError::new(ErrorKind::Auth, "no token"));

    let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
    let session = Session::builder().middleware(breaker.clone()).build().unwrap();

    breaker.force_open();
    tokio::time::sleep(Duration::from_millis(40)).await;

    let spec = session.get(server.uri()).with_middleware(rejecting);
    let err = session.execute(spec).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::Auth));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    // The abandoned trial freed its slot, so the next request is admitted.
    let response = session.execute(session.get(server.uri())).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn dropped_trial_request_frees_the_slot_and_gauges() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
    let metrics = MetricsMiddleware::new();
    let session = Session::builder()
        .middleware(metrics.clone())
        .middleware(breaker.clone())
        .build()
        .unwrap();

    breaker.force_open();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let slow = format!("{}/slow", server.uri());
    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), session.execute(session.get(&slow))).await;
    assert!(timed_out.is_err());

    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert_eq!(metrics.snapshot().in_flight, 0);
    assert_eq!(session.pool().stats().active_connections, 0);

    let fast = format!("{}/fast", server.uri());
    let response = session.execute(session.get(&fast)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn cache_hits_below_the_breaker_leave_it_half_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(&server)
        .await;

    let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
    let session = Session::builder()
        .middleware(breaker.clone())
        .middleware(ResponseCache::new(Duration::from_secs(60)))
        .build()
        .unwrap();

    let primed = session.execute(session.get(server.uri())).await.unwrap();
    assert!(!primed.is_from_cache());

    breaker.force_open();
    tokio::time::sleep(Duration::from_millis(80)).await;

    for _ in 0..2 {
        let response = session.execute(session.get(server.uri())).await.unwrap();
        assert!(response.is_from_cache());
        assert_eq!(response.text(), "stored");
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
