//! Platform client integration tests with mock server

use std::io::Write;

use jitwatch::error::PlatformError;
use jitwatch::identity::Identity;
use jitwatch::model::RequestState;
use jitwatch::platform::{AccessPlatform, LockSpec, PlatformClient, RequestDecision};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test client pointing to the mock server
fn create_test_client(mock_server: &MockServer, credential: &str) -> PlatformClient {
    let mut identity_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(identity_file, "{}", credential).unwrap();

    let identity = Identity::load(identity_file.path()).unwrap();
    PlatformClient::new(&mock_server.uri(), identity).unwrap()
}

#[tokio::test]
async fn test_ping_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .and(header("Authorization", "Bearer test-credential"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_ping_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "bad-credential");
    let result = client.ping().await;
    assert!(matches!(result.unwrap_err(), PlatformError::Unauthorized));
}

#[tokio::test]
async fn test_list_access_requests_adapts_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/access-requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "req-1",
                "user": "alice",
                "roles": ["db-readonly"],
                "resources": [
                    {"kind": "node", "name": "web-1"},
                    {"kind": "db", "name": "orders", "cluster": "east"}
                ],
                "created_at": "2025-06-01T12:00:00Z",
                "state": "PENDING"
            },
            {
                "id": "req-2",
                "user": "bob",
                "roles": [],
                "resources": [],
                "created_at": "2025-06-01T13:00:00Z",
                "state": "SUSPENDED"
            }
        ])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    let requests = client.list_access_requests().await.unwrap();

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].id, "req-1");
    assert_eq!(requests[0].user, "alice");
    assert_eq!(requests[0].state, RequestState::Pending);
    assert_eq!(requests[0].resource_count(), 2);
    assert_eq!(requests[0].resource_summary(), "node:web-1,db:orders");

    // Unknown platform states are carried as Other and later ignored.
    assert_eq!(requests[1].state, RequestState::Other);
}

#[tokio::test]
async fn test_set_request_state_sends_decision_and_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/access-requests/req-1/state"))
        .and(header("Authorization", "Bearer test-credential"))
        .and(body_partial_json(json!({
            "state": "DENIED",
            "reason": "Request contains 4 resources, exceeds limit of 3"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    client
        .set_request_state(
            "req-1",
            RequestDecision::Denied,
            "Request contains 4 resources, exceeds limit of 3",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upsert_lock_uses_naming_contract() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/locks/jit-watcher-req-9"))
        .and(body_partial_json(json!({
            "target": "req-9",
            "message": "policy violated"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    let lock = LockSpec::for_request("req-9", "policy violated");
    client.upsert_lock(&lock).await.unwrap();
}

#[tokio::test]
async fn test_upsert_lock_is_idempotent_on_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/locks/jit-watcher-req-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    let lock = LockSpec::for_request("req-9", "policy violated");

    // Re-issuing the same lock name is an upsert, not a conflict.
    client.upsert_lock(&lock).await.unwrap();
    client.upsert_lock(&lock).await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_typed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/access-requests"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    let result = client.list_access_requests().await;

    match result.unwrap_err() {
        PlatformError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_response_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/access-requests"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, "test-credential");
    let result = client.list_access_requests().await;
    assert!(matches!(
        result.unwrap_err(),
        PlatformError::InvalidResponse(_)
    ));
}
