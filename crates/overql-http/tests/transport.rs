// Integration tests for the HTTP transport against a mock Overpass endpoint

use overql_core::{RawResponse, Transport, TransportError};
use overql_http::{HttpConfig, HttpMethod, HttpTransport};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERPRETER_PATH: &str = "/api/interpreter";

fn config_for(server: &MockServer, method: HttpMethod) -> HttpConfig {
    HttpConfig::default()
        .with_endpoint(format!("{}{}", server.uri(), INTERPRETER_PATH))
        .with_method(method)
        .with_timeout_secs(10)
        .with_user_agent("overql-tests")
}

// The blocking client runs its own runtime, so it is built, used and
// dropped off the async test thread.
async fn submit_blocking(
    config: HttpConfig,
    program: &str,
) -> Result<RawResponse, TransportError> {
    let program = program.to_string();
    tokio::task::spawn_blocking(move || {
        let transport = HttpTransport::new(config).expect("Failed to build transport");
        transport.submit(&program)
    })
    .await
    .expect("Blocking submit panicked")
}

#[tokio::test]
async fn test_post_sends_program_as_body() {
    let server = MockServer::start().await;
    let program = "[out:json];node[amenity=cafe];out;";

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .and(body_string(program))
        .and(header("user-agent", "overql-tests"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"elements":[]}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = submit_blocking(config_for(&server, HttpMethod::Post), program)
        .await
        .expect("Request failed");

    assert_eq!(response.status, 200);
    assert!(response.is_success());
    assert_eq!(response.body, r#"{"elements":[]}"#);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(String::from_utf8_lossy(&requests[0].body), program);
}

#[tokio::test]
async fn test_get_sends_program_as_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(INTERPRETER_PATH))
        .and(query_param("data", "out;"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let response = submit_blocking(config_for(&server, HttpMethod::Get), "out;")
        .await
        .expect("Request failed");
    assert_eq!(response.body, "{}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("data=out%3B"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INTERPRETER_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("parse error"))
        .expect(1)
        .mount(&server)
        .await;

    let err = submit_blocking(config_for(&server, HttpMethod::Post), "node[")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransportError::Status {
            code: 400,
            body: "parse error".to_string(),
        }
    );
}

#[tokio::test]
async fn test_no_retry_after_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(504).set_body_string("timeout"))
        .expect(1)
        .mount(&server)
        .await;

    let err = submit_blocking(config_for(&server, HttpMethod::Post), "out;")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { code: 504, .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    // bind then drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = HttpConfig::default()
        .with_endpoint(format!("http://127.0.0.1:{}{}", port, INTERPRETER_PATH))
        .with_timeout_secs(5);

    assert!(matches!(
        submit_blocking(config, "out;").await,
        Err(TransportError::Connection(_))
    ));
}
