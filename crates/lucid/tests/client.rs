//! End-to-end tests: a client against a mock Lucid server, across restarts.

use std::sync::Arc;
use std::time::Duration;

use lucid::prelude::*;
use lucid::session::{Endpoint, PersistedSession};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BANNER: &str = "Lucid Version 0.1.2";

// =========================================================================
// Helpers
// =========================================================================

async fn lucid_server(accepted: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_lucid(&server, accepted).await;
    server
}

async fn mount_lucid(server: &MockServer, accepted: &str) {
    Mock::given(method("GET"))
        .and(path("/ui/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BANNER))
        .mount(server)
        .await;
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
            ResponseTemplate::new(401)
                .set_body_string(r#"{"message":"Invalid JWT token in Authorization header."}"#),
        )
        .with_priority(2)
        .mount(server)
        .await;
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Some(Duration::from_secs(5))).expect("client should build")
}

async fn client<P: PersistenceAdapter>(
    persistence: P,
) -> (LucidClient<ReqwestTransport, P>, lucid::session::NavigationReceiver) {
    LucidClientBuilder::new()
        .probe_timeout(Duration::from_secs(2))
        .build(transport(), persistence)
        .await
}

/// Polls until the autosave task has written something matching `pred`.
async fn wait_for_saved(
    store: &MemoryStateStore,
    pred: impl Fn(&Option<PersistedSession>) -> bool,
) -> Option<PersistedSession> {
    for _ in 0..200 {
        let saved = store.saved().await;
        if pred(&saved) {
            return saved;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("autosave never produced the expected projection");
}

// =========================================================================
// Login / logout
// =========================================================================

#[tokio::test]
async fn test_fresh_client_starts_logged_out_on_login_view() {
    let (client, _intents) = client(MemoryStateStore::new()).await;

    assert_eq!(client.store().state(), SessionState::LoggedOut);
    assert_eq!(client.route_guard().current(), Route::Login);
    assert_eq!(client.resume().await, ResumeOutcome::Skipped);
    assert_eq!(client.login_prefill().to_string(), "http://localhost:7090");
}

#[tokio::test]
async fn test_login_navigates_home_and_autosaves() {
    let server = lucid_server("abc").await;
    let memory = Arc::new(MemoryStateStore::new());
    let (client, mut intents) = client(Arc::clone(&memory)).await;
    let mut guard = client.route_guard();

    let session = client
        .login(&server.uri(), "abc", false)
        .await
        .expect("login should succeed");

    assert!(session.is_logged_in());
    assert_eq!(session.current_version(), Some(BANNER));
    let intent = intents.try_recv().expect("a Home intent");
    assert_eq!(guard.apply(intent), Route::Home);

    let saved = wait_for_saved(&memory, |s| s.as_ref().is_some_and(|p| p.credential.is_some()))
        .await
        .unwrap();
    assert_eq!(saved.endpoint.version.as_deref(), Some(BANNER));
}

#[tokio::test]
async fn test_login_rejected_credential_stays_logged_out() {
    let server = lucid_server("abc").await;
    let (client, mut intents) = client(MemoryStateStore::new()).await;

    let err = client.login(&server.uri(), "wrong", false).await.unwrap_err();

    assert_eq!(err.to_string(), "Error 401 - Invalid JWT token in Authorization header.");
    assert!(!client.store().is_logged_in());
    assert!(intents.try_recv().is_err(), "no intent on a failed login");
}

#[tokio::test]
async fn test_login_with_bad_address_returns_protocol_error() {
    let (client, _intents) = client(MemoryStateStore::new()).await;

    let result = client.login("not a url", "abc", false).await;

    assert!(matches!(result, Err(LucidError::Protocol(_))));
}

#[tokio::test]
async fn test_logout_with_remember_prefills_address() {
    let server = lucid_server("abc").await;
    let (client, _intents) = client(MemoryStateStore::new()).await;
    client.login(&server.uri(), "abc", true).await.unwrap();

    let session = client.logout().await;

    assert!(!session.is_logged_in());
    assert_eq!(client.login_prefill().to_string(), server.uri());
}

#[tokio::test]
async fn test_logout_without_remember_prefills_default() {
    let server = lucid_server("abc").await;
    let (client, _intents) = client(MemoryStateStore::new()).await;
    client.login(&server.uri(), "abc", false).await.unwrap();

    client.logout().await;

    assert_eq!(client.login_prefill(), client.config().server_uri);
}

// =========================================================================
// Persistence across restarts
// =========================================================================

#[tokio::test]
async fn test_restart_resumes_valid_session_from_state_file() {
    let server = lucid_server("abc").await;
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let (first, _intents) = client(FileStateStore::new(&state)).await;
    first.login(&server.uri(), "abc", true).await.unwrap();
    first.shutdown().await.expect("final save should succeed");

    let (second, _intents) = client(FileStateStore::new(&state)).await;
    assert!(second.store().is_logged_in(), "session should be restored");

    let outcome = second.resume().await;

    assert_eq!(
        outcome,
        ResumeOutcome::Resumed {
            version: BANNER.into()
        }
    );
    assert_eq!(second.store().state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_restart_with_revoked_credential_forces_login_with_reason() {
    let server = lucid_server("abc").await;
    let memory = Arc::new(MemoryStateStore::new());

    let (first, _intents) = client(Arc::clone(&memory)).await;
    first.login(&server.uri(), "abc", true).await.unwrap();
    first.shutdown().await.unwrap();

    server.reset().await;
    mount_lucid(&server, "rotated").await;

    let (second, mut intents) = client(Arc::clone(&memory)).await;
    let mut guard = second.route_guard();
    assert_eq!(guard.current(), Route::Home);

    let outcome = second.resume().await;

    assert!(matches!(outcome, ResumeOutcome::LoggedOut { .. }), "got {outcome:?}");
    let intent = intents.try_recv().expect("a Login intent");
    assert_eq!(guard.apply(intent), Route::Login);
    assert!(guard.login_reason().is_some_and(|r| r.contains("Invalid JWT token")));

    // The address was remembered, so only the credential is gone.
    let saved = wait_for_saved(&memory, |s| s.as_ref().is_some_and(|p| p.credential.is_none()))
        .await
        .unwrap();
    assert_eq!(saved.endpoint.address.map(|a| a.to_string()), Some(server.uri()));
}

#[tokio::test]
async fn test_corrupt_state_file_starts_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    std::fs::write(&state, b"definitely not json").unwrap();

    let (client, _intents) = client(FileStateStore::new(&state)).await;

    assert!(!client.store().is_logged_in());
    assert_eq!(client.resume().await, ResumeOutcome::Skipped);
}

#[tokio::test]
async fn test_logout_right_after_build_clears_saved_credential() {
    let restored = PersistedSession {
        credential: Some("abc".into()),
        endpoint: Endpoint {
            address: Some(ServerAddress::parse("http://x").unwrap()),
            version: Some(BANNER.into()),
            remember: false,
        },
    };
    let memory = Arc::new(MemoryStateStore::with_saved(restored));
    let (client, _intents) = client(Arc::clone(&memory)).await;

    client.logout().await;

    let saved = wait_for_saved(&memory, |s| s.as_ref().is_some_and(|p| p.credential.is_none()))
        .await
        .unwrap();
    assert_eq!(saved.endpoint.address, None);
}

#[tokio::test]
async fn test_loading_flag_is_never_persisted() {
    let restored = PersistedSession {
        credential: Some("abc".into()),
        endpoint: Endpoint {
            address: Some(ServerAddress::parse("http://x").unwrap()),
            version: Some(BANNER.into()),
            remember: false,
        },
    };
    let memory = Arc::new(MemoryStateStore::with_saved(restored.clone()));
    let (client, _intents) = client(Arc::clone(&memory)).await;

    client.store().set_loading(true);
    client.persist().await.unwrap();

    assert!(client.store().is_loading());
    assert_eq!(memory.saved().await, Some(restored));
}

// =========================================================================
// Gateway through the client
// =========================================================================

#[tokio::test]
async fn test_gateway_uses_logged_in_session() {
    let server = lucid_server("abc").await;
    Mock::given(method("PUT"))
        .and(path("/kv/foo"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (client, _intents) = client(MemoryStateStore::new()).await;

    let before = client.gateway().store_any("foo", "hello").await;
    assert!(matches!(before, Err(GatewayError::NotAuthenticated)));

    client.login(&server.uri(), "abc", false).await.unwrap();
    client
        .gateway()
        .store_any("foo", "hello")
        .await
        .expect("put should succeed once logged in");
}
