//! The retry middleware re-runs the whole pipeline.

use super::helpers::*;
use courier::middleware::RetryMiddleware;
use courier::{ErrorKind, Session};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryMiddleware {
    RetryMiddleware::builder()
        .max_attempts(max_attempts)
        .fixed_backoff(Duration::from_millis(10))
        .build()
}

#[tokio::test]
async fn recovers_after_transient_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .mount(&server)
        .await;

    let attempts = AttemptCounter::default();
    let session = Session::builder()
        .middleware(fast_retry(3))
        .middleware(attempts.clone())
        .build()
        .unwrap();

    let response = session.execute(session.get(server.uri())).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "finally");
    assert_eq!(attempts.count(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn gives_back_the_last_outcome_when_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let exhausted = Arc::new(AtomicU32::new(0));
    let e = Arc::clone(&exhausted);
    let retry = RetryMiddleware::builder()
        .max_attempts(4)
        .fixed_backoff(Duration::from_millis(5))
        .on_exhausted(move |attempts| e.store(attempts, Ordering::SeqCst))
        .build();
    let session = Session::builder().middleware(retry).build().unwrap();

    let response = session.execute(session.get(server.uri())).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(exhausted.load(Ordering::SeqCst), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::builder().middleware(fast_retry(5)).build().unwrap();
    let response = session.execute(session.get(server.uri())).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn transport_errors_are_retried() {
    let attempts = AttemptCounter::default();
    let session = Session::builder()
        .middleware(fast_retry(3))
        .middleware(attempts.clone())
        .build()
        .unwrap();

    let err = session.execute(session.get(UNREACHABLE)).await.unwrap_err();

    assert!(err.is_kind(ErrorKind::Network));
    assert_eq!(attempts.count(), 3);
}

#[tokio::test]
async fn request_scoped_retry_applies_to_that_request_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let session = Session::new().unwrap();

    session.execute(session.get(server.uri())).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let spec = session.get(server.uri()).with_middleware(fast_retry(2));
    session.execute(spec).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retry_is_skipped_when_the_wait_would_pass_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let retry = RetryMiddleware::builder()
        .max_attempts(5)
        .fixed_backoff(Duration::from_secs(5))
        .build();
    let session = Session::builder().middleware(retry).build().unwrap();

    let started = std::time::Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let response = session
        .execute(session.get(server.uri()).deadline(deadline))
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn enormous_retry_after_ends_the_request_without_waiting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("retry-after", "18446744073709551615"),
        )
        .mount(&server)
        .await;

    let retry = RetryMiddleware::builder()
        .max_attempts(3)
        .max_retry_after(Duration::MAX)
        .build();
    let session = Session::builder().middleware(retry).build().unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let response = session
        .execute(session.get(server.uri()).deadline(deadline))
        .await
        .unwrap();
    assert_eq!(response.status(), 429);

    let response = session
        .execute(session.get(server.uri()).timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
