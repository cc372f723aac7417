//! Hook ordering across session and request middlewares.

use super::helpers::*;
use courier::{ErrorKind, HttpError, Phase, Session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn hooks_run_as_an_onion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let log = hook_log();
    let session = Session::builder()
        .middleware(Recorder::new("a", &log))
        .middleware(Recorder::new("b", &log))
        .build()
        .unwrap();

    let spec = session
        .get(format!("{}/ok", server.uri()))
        .with_middleware(Recorder::new("c", &log));
    session.execute(spec).await.unwrap();

    assert_eq!(
        entries(&log),
        vec!["before:a", "before:b", "before:c", "after:c", "after:b", "after:a"]
    );
}

#[tokio::test]
async fn before_hook_failure_skips_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let log = hook_log();
    let mut failing = Recorder::new("auth", &log);
    failing.fail_before = Some(HttpError::new(ErrorKind::Auth, "token expired"));

    let session = Session::builder()
        .middleware(Recorder::new("outer", &log))
        .middleware(failing)
        .middleware(Recorder::new("inner", &log))
        .build()
        .unwrap();

    let err = session.execute(session.get(server.uri())).await.unwrap_err();

    assert!(err.is_kind(ErrorKind::Auth));
    assert_eq!(err.phase(), Some(Phase::BeforeRequest));
    assert!(err.to_string().contains("middleware before-request failed"));
    assert!(err.to_string().contains("token expired"));
    assert_eq!(entries(&log), vec!["before:outer", "before:auth", "error:outer"]);
}

#[tokio::test]
async fn after_hook_failure_stops_the_unwind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let log = hook_log();
    let mut failing = Recorder::new("validator", &log);
    failing.fail_after = true;

    let session = Session::builder()
        .middleware(Recorder::new("outer", &log))
        .middleware(failing)
        .middleware(Recorder::new("inner", &log))
        .build()
        .unwrap();

    let err = session.execute(session.get(server.uri())).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::AfterResponse));
    assert!(err.to_string().contains("middleware after-response failed"));
    assert_eq!(
        entries(&log),
        vec![
            "before:outer",
            "before:validator",
            "before:inner",
            "after:inner",
            "after:validator",
            "error:outer",
        ]
    );
}

#[tokio::test]
async fn transport_failure_notifies_every_admitting_middleware() {
    let log = hook_log();
    let session = Session::builder()
        .middleware(Recorder::new("a", &log))
        .middleware(Recorder::new("b", &log))
        .build()
        .unwrap();

    let err = session.execute(session.get(UNREACHABLE)).await.unwrap_err();

    assert!(err.is_kind(ErrorKind::Network));
    assert_eq!(err.phase(), Some(Phase::Transport));
    assert_eq!(
        entries(&log),
        vec!["before:a", "before:b", "error:b", "error:a"]
    );
}

#[tokio::test]
async fn request_middlewares_can_be_cleared_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let log = hook_log();
    let session = Session::builder()
        .middleware(Recorder::new("session", &log))
        .build()
        .unwrap();

    let mut spec = session
        .get(server.uri())
        .with_middleware(Recorder::new("request", &log));
    spec.clear_middlewares();
    session.execute(spec).await.unwrap();

    assert_eq!(entries(&log), vec!["before:session", "after:session"]);
}
