//! Integration tests for the HTTP validators and a full store lifecycle
//! against a mock Lucid server.

use std::time::Duration;

use lucid_protocol::ServerAddress;
use lucid_session::{
    Credential, EndpointValidator, HttpEndpointValidator, HttpTokenValidator,
    NavigationIntent, ResumeOutcome, Session, SessionConfig, SessionError,
    SessionState, SessionStore, TokenValidator,
};
use lucid_transport::ReqwestTransport;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BANNER: &str = "Lucid Version 0.1.2";

// =========================================================================
// Helpers
// =========================================================================

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(None).expect("client should build")
}

fn address(server: &MockServer) -> ServerAddress {
    ServerAddress::parse(&server.uri()).expect("mock uri is valid")
}

async fn mount_banner(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/ui/version"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_token_check(server: &MockServer, accepted: &str) {
    Mock::given(method("GET"))
        .and(path("/check-token"))
        .and(header("authorization", format!("Bearer {accepted}").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(
                r#"{"message":"Invalid JWT token in Authorization header."}"#,
            ),
        )
        .with_priority(2)
        .mount(server)
        .await;
}

/// An address nothing listens on.
fn dead_address() -> ServerAddress {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ServerAddress::parse(&format!("http://{addr}")).unwrap()
}

// =========================================================================
// HttpEndpointValidator
// =========================================================================

#[tokio::test]
async fn test_endpoint_validate_lucid_banner_returns_version() {
    let server = MockServer::start().await;
    mount_banner(&server, 200, BANNER).await;

    let version = HttpEndpointValidator::new(transport())
        .validate(&address(&server))
        .await
        .expect("should validate");

    assert_eq!(version, BANNER);
}

#[tokio::test]
async fn test_endpoint_validate_success_with_wrong_body_is_invalid() {
    let server = MockServer::start().await;
    mount_banner(&server, 200, "<html>It works!</html>").await;

    let result = HttpEndpointValidator::new(transport())
        .validate(&address(&server))
        .await;

    assert!(
        matches!(result, Err(SessionError::EndpointInvalid { .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_endpoint_validate_error_status_is_invalid() {
    let server = MockServer::start().await;
    mount_banner(&server, 404, BANNER).await;

    let result = HttpEndpointValidator::new(transport())
        .validate(&address(&server))
        .await;

    assert!(matches!(result, Err(SessionError::EndpointInvalid { .. })));
}

#[tokio::test]
async fn test_endpoint_validate_dead_address_is_unreachable() {
    let result = HttpEndpointValidator::new(transport())
        .validate(&dead_address())
        .await;

    assert!(
        matches!(result, Err(SessionError::EndpointUnreachable { .. })),
        "got {result:?}"
    );
}

// =========================================================================
// HttpTokenValidator
// =========================================================================

#[tokio::test]
async fn test_token_validate_accepted_credential_succeeds() {
    let server = MockServer::start().await;
    mount_token_check(&server, "abc").await;

    HttpTokenValidator::new(transport())
        .validate(&address(&server), &Credential::new("abc"))
        .await
        .expect("credential should be accepted");
}

#[tokio::test]
async fn test_token_validate_rejected_credential_carries_server_message() {
    let server = MockServer::start().await;
    mount_token_check(&server, "abc").await;

    let result = HttpTokenValidator::new(transport())
        .validate(&address(&server), &Credential::new("nope"))
        .await;

    match result {
        Err(SessionError::TokenInvalid { status, message }) => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Invalid JWT token in Authorization header.");
        }
        other => panic!("expected TokenInvalid, got {other:?}"),
    }
}

#[tokio::test]
async fn test_token_validate_non_json_error_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(path("/check-token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = HttpTokenValidator::new(transport())
        .validate(&address(&server), &Credential::new("abc"))
        .await;

    match result {
        Err(SessionError::TokenInvalid { status, message }) => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "the server rejected the credential");
        }
        other => panic!("expected TokenInvalid, got {other:?}"),
    }
}

// =========================================================================
// SessionStore over HTTP
// =========================================================================

type HttpStore =
    SessionStore<HttpEndpointValidator<ReqwestTransport>, HttpTokenValidator<ReqwestTransport>>;

fn http_store(initial: Session, config: SessionConfig) -> (HttpStore, lucid_session::NavigationReceiver) {
    SessionStore::new(
        config,
        initial,
        HttpEndpointValidator::new(transport()),
        HttpTokenValidator::new(transport()),
    )
}

#[tokio::test]
async fn test_store_login_then_resume_after_credential_revoked() {
    let server = MockServer::start().await;
    mount_banner(&server, 200, BANNER).await;
    mount_token_check(&server, "abc").await;

    // First run: log in and keep the projection.
    let (store, _intents) = http_store(Session::default(), SessionConfig::default());
    store
        .login(address(&server), Credential::new("abc"), false)
        .await
        .expect("login should succeed");
    let saved = store.snapshot().to_persisted();

    // The server rotates its secret: "abc" is no longer accepted.
    server.reset().await;
    mount_banner(&server, 200, BANNER).await;
    mount_token_check(&server, "rotated").await;

    // Second run: restore and resume.
    let (store, mut intents) =
        http_store(Session::restore(saved), SessionConfig::default());
    assert_eq!(store.state(), SessionState::LoggedIn);

    let outcome = store.resume_check().await;

    assert!(matches!(outcome, ResumeOutcome::LoggedOut { .. }), "got {outcome:?}");
    assert_eq!(store.state(), SessionState::LoggedOut);
    match intents.try_recv() {
        Ok(NavigationIntent::Login { reason: Some(reason) }) => {
            assert!(reason.contains("Invalid JWT token"), "reason was {reason:?}");
        }
        other => panic!("expected Login intent with reason, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_slow_token_check_times_out_as_token_invalid() {
    let server = MockServer::start().await;
    mount_banner(&server, 200, BANNER).await;
    Mock::given(path("/check-token"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let (store, _intents) = http_store(
        Session::default(),
        SessionConfig {
            probe_timeout: Duration::from_millis(200),
        },
    );

    let result = store.login(address(&server), Credential::new("abc"), false).await;

    assert!(
        matches!(result, Err(SessionError::TokenInvalid { status: None, .. })),
        "got {result:?}"
    );
    assert!(!store.is_logged_in());
}
