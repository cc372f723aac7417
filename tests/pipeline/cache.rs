//! Cache hits answer without touching the network.

use super::helpers::*;
use courier::middleware::{MetricsMiddleware, ResponseCache};
use courier::Session;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn second_get_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string("items"))
        .expect(1)
        .mount(&server)
        .await;

    let log = hook_log();
    let metrics = MetricsMiddleware::new();
    let session = Session::builder()
        .middleware(metrics.clone())
        .middleware(Recorder::new("outer", &log))
        .middleware(ResponseCache::new(Duration::from_secs(60)))
        .middleware(Recorder::new("inner", &log))
        .build()
        .unwrap();
    let url = format!("{}/catalog", server.uri());

    let first = session.execute(session.get(&url)).await.unwrap();
    let second = session.execute(session.get(&url)).await.unwrap();

    assert!(!first.is_from_cache());
    assert!(second.is_from_cache());
    assert_eq!(second.text(), "items");

    // The hit stops at the cache; only middlewares in front of it unwind.
    assert_eq!(
        entries(&log),
        vec![
            "before:outer",
            "before:inner",
            "after:inner",
            "after:outer",
            "before:outer",
            "after:outer",
        ]
    );
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.responses, 2);
    assert_eq!(snapshot.cache_hits, 1);
}

#[tokio::test]
async fn writes_and_uncacheable_responses_go_to_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(200).insert_header("cache-control", "no-store"))
        .expect(2)
        .mount(&server)
        .await;

    let cache = ResponseCache::new(Duration::from_secs(60));
    let session = Session::builder().middleware(cache.clone()).build().unwrap();

    for _ in 0..2 {
        session
            .execute(session.post(server.uri()).body("{}"))
            .await
            .unwrap();
        session
            .execute(session.get(format!("{}/private", server.uri())))
            .await
            .unwrap();
    }
    assert!(cache.is_empty());
}

#[tokio::test]
async fn invalidated_entries_are_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let cache = ResponseCache::new(Duration::from_secs(60));
    let session = Session::builder().middleware(cache.clone()).build().unwrap();
    let url = format!("{}/", server.uri());

    session.execute(session.get(&url)).await.unwrap();
    assert!(cache.invalidate(&url));
    let response = session.execute(session.get(&url)).await.unwrap();
    assert!(!response.is_from_cache());
}
