//! Rate limiting through a session.

use courier::middleware::RateLimitMiddleware;
use courier::{ErrorKind, Phase, RateLimiter, Session};
use std::time::{Duration, Instant};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn requests_beyond_the_burst_wait_for_refill() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let limiter = RateLimiter::new(10).unwrap();
    let session = Session::builder()
        .middleware(RateLimitMiddleware::new(limiter.clone()))
        .build()
        .unwrap();

    let start = Instant::now();
    for _ in 0..12 {
        session.execute(session.get(server.uri())).await.unwrap();
    }

    // Ten tokens are available up front; the last two need ~100ms each.
    assert!(start.elapsed() >= Duration::from_millis(150), "{:?}", start.elapsed());
    limiter.close();
}

#[tokio::test]
async fn closing_the_limiter_fails_waiting_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let limiter = RateLimiter::new(1).unwrap();
    limiter.try_acquire().unwrap();

    let session = Session::builder()
        .middleware(RateLimitMiddleware::new(limiter.clone()))
        .build()
        .unwrap();

    let waiting = {
        let session = session.clone();
        let url = server.uri();
        tokio::spawn(async move { session.execute(session.get(url)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    limiter.close();

    let err = waiting.await.unwrap().unwrap_err();
    assert!(err.is_kind(ErrorKind::RateLimit));
    assert_eq!(err.phase(), Some(Phase::BeforeRequest));

    let err = session.execute(session.get(server.uri())).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::RateLimit));
    assert!(server.received_requests().await.unwrap().is_empty());
}
