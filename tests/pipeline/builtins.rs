//! Built-in header middlewares against a live server.

use courier::middleware::{
    AuthMiddleware, LoggingMiddleware, RequestIdMiddleware, UserAgentRotation, REQUEST_ID_HEADER,
};
use courier::Session;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn header_middlewares_decorate_every_attempt() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer secret"))
        .and(header_exists(REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let session = Session::builder()
        .middleware(LoggingMiddleware::new().slow_threshold(Duration::from_secs(5)))
        .middleware(RequestIdMiddleware::new())
        .middleware(AuthMiddleware::bearer("secret").unwrap())
        .middleware(UserAgentRotation::new(["agent-a/1", "agent-b/2"]).unwrap())
        .build()
        .unwrap();

    for _ in 0..3 {
        let response = session.execute(session.get(server.uri())).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    let received = server.received_requests().await.unwrap();
    let agents: Vec<_> = received
        .iter()
        .map(|request| request.headers.get("user-agent").unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(agents, vec!["agent-a/1", "agent-b/2", "agent-a/1"]);

    let ids: Vec<_> = received
        .iter()
        .map(|request| request.headers.get(REQUEST_ID_HEADER).unwrap().clone())
        .collect();
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn caller_supplied_authorization_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer caller"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::builder()
        .middleware(AuthMiddleware::bearer("session").unwrap())
        .build()
        .unwrap();

    let spec = session
        .get(server.uri())
        .header("authorization", "Bearer caller");
    let response = session.execute(spec).await.unwrap();
    assert_eq!(response.status(), 204);
}
