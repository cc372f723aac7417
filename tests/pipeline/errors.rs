//! Error classification as seen by callers.

use super::helpers::*;
use courier::{ErrorKind, Phase, Session};
use std::error::Error as _;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn statuses_map_to_kinds() {
    let cases = [
        (401, ErrorKind::Auth),
        (403, ErrorKind::Auth),
        (404, ErrorKind::ClientError),
        (429, ErrorKind::RateLimit),
        (502, ErrorKind::ServerError),
    ];

    for (status, kind) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let session = Session::new().unwrap();
        let response = session.execute(session.get(server.uri())).await.unwrap();
        let err = response.error_for_status().unwrap_err();

        assert!(err.is_kind(kind), "status {} gave {:?}", status, err.kind());
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.phase(), Some(Phase::Response));
    }
}

#[tokio::test]
async fn elapsed_deadline_is_a_transport_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let log = hook_log();
    let session = Session::builder()
        .middleware(Recorder::new("observer", &log))
        .build()
        .unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_millis(50);
    let err = session
        .execute(session.get(server.uri()).deadline(deadline))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(err.is_retryable());
    assert_eq!(err.phase(), Some(Phase::Transport));
    assert_eq!(entries(&log), vec!["before:observer", "error:observer"]);
}

#[tokio::test]
async fn build_errors_run_no_middleware() {
    let log = hook_log();
    let session = Session::builder()
        .middleware(Recorder::new("a", &log))
        .build()
        .unwrap();

    let err = session
        .execute(session.get("http://example.test/").header("bad header", "x"))
        .await
        .unwrap_err();

    assert!(err.is_kind(ErrorKind::Validation));
    assert_eq!(err.phase(), Some(Phase::Build));
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn network_errors_keep_their_cause() {
    let session = Session::new().unwrap();
    let err = session.execute(session.get(UNREACHABLE)).await.unwrap_err();

    assert!(err.is_kind(ErrorKind::Network));
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("network: "));
}
