use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;

use wiremock::{
    Mock, MockServer,
    matchers::{body_partial_json, header, method, path},
};

use crate::api::{
    ApiClient, ApiError, AuthSession, Role, RunStatus,
    test_helpers::{closed_port, envelope, json_status, received, test_client},
};

#[test]
fn unwrap_envelope_returns_data_on_success() {
    let client = test_client("http://127.0.0.1:1");

    let data = client
        .unwrap_envelope(StatusCode::OK, r#"{"code":0,"message":"ok","data":[1,2]}"#)
        .expect("envelope should unwrap");

    assert_eq!(data, json!([1, 2]));
}

#[test]
fn unwrap_envelope_surfaces_business_errors_even_on_200() {
    let client = test_client("http://127.0.0.1:1");

    let err = client
        .unwrap_envelope(
            StatusCode::OK,
            r#"{"code":40401,"message":"session not found","data":null}"#,
        )
        .expect_err("non-zero code should fail");

    assert_eq!(
        err,
        ApiError::Business {
            code: 40401,
            message: "session not found".to_string()
        }
    );
    assert_eq!(err.to_string(), "session not found (code 40401)");
}

#[test]
fn unwrap_envelope_reports_malformed_bodies_as_transport_errors() {
    let client = test_client("http://127.0.0.1:1");

    let err = client
        .unwrap_envelope(StatusCode::OK, "<html>gateway</html>")
        .expect_err("non-json body should fail");
    assert!(matches!(err, ApiError::Transport(message) if message.contains("malformed")));

    let err = client
        .unwrap_envelope(StatusCode::BAD_GATEWAY, "<html>gateway</html>")
        .expect_err("5xx should fail");
    assert!(matches!(err, ApiError::Transport(message) if message.contains("502")));
}

#[test]
fn unauthorized_clears_token_and_requests_login() {
    let auth = Arc::new(AuthSession::new(Some("stale".to_string())));
    let client = ApiClient::new("http://127.0.0.1:1", Arc::clone(&auth));

    let err = client
        .unwrap_envelope(
            StatusCode::UNAUTHORIZED,
            r#"{"code":401,"message":"token expired","data":null}"#,
        )
        .expect_err("401 should fail");

    assert_eq!(
        err,
        ApiError::Unauthorized {
            message: "token expired".to_string()
        }
    );
    assert!(!auth.is_authenticated());
    assert!(auth.take_login_required());
    assert!(!auth.take_login_required());
}

#[test]
fn unauthorized_on_login_view_keeps_user_in_place() {
    let auth = Arc::new(AuthSession::new(None));
    auth.set_on_login_view(true);
    let client = ApiClient::new("http://127.0.0.1:1", Arc::clone(&auth));

    let err = client
        .unwrap_envelope(StatusCode::UNAUTHORIZED, "")
        .expect_err("401 should fail");

    assert_eq!(
        err,
        ApiError::Unauthorized {
            message: "Unauthorized".to_string()
        }
    );
    assert!(!auth.take_login_required());
}

#[tokio::test]
async fn list_session_messages_sends_bearer_token_and_decodes_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/s1/messages"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(envelope(json!([
            {
                "id": "m1",
                "role": "user",
                "content": {"type": "text", "text": "hello"},
                "created_at": "2025-01-02T03:04:05Z"
            },
            {
                "id": "m2",
                "role": "assistant",
                "content": {"type": "text", "text": "hi there"},
                "run_id": "r1",
                "created_at": "2025-01-02T03:04:06Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server.uri());

    let messages = client
        .list_session_messages("s1")
        .await
        .expect("list messages should succeed");

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].run_ref(), Some("r1"));
    assert_eq!(messages[1].content.display_text(), "hi there");
}

#[tokio::test]
async fn null_list_payload_reads_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs"))
        .respond_with(envelope(serde_json::Value::Null))
        .mount(&server)
        .await;
    let client = test_client(&server.uri());

    let runs = client.list_runs().await.expect("list runs should succeed");

    assert!(runs.is_empty());
}

#[tokio::test]
async fn list_runs_decodes_status_and_latency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/runs"))
        .respond_with(envelope(json!([{
            "id": "r1",
            "session_id": "s1",
            "agent_id": "a1",
            "trace_id": "t1",
            "status": "succeeded",
            "created_at": "2025-01-02T03:04:05Z",
            "finished_at": "2025-01-02T03:04:06.500Z"
        }])))
        .mount(&server)
        .await;
    let client = test_client(&server.uri());

    let runs = client.list_runs().await.expect("list runs should succeed");

    assert_eq!(runs[0].status, RunStatus::Succeeded);
    assert_eq!(runs[0].latency_ms(), Some(1500));
}

#[tokio::test]
async fn login_stores_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"email": "admin@example.com", "password": "secret"})))
        .respond_with(envelope(json!({
            "access_token": "fresh",
            "refresh_token": "refresh",
            "user": {"id": "u1", "email": "admin@example.com", "name": "Admin", "roles": ["admin"]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    let auth = Arc::new(AuthSession::new(None));
    let client = ApiClient::new(&server.uri(), Arc::clone(&auth));

    let response = client
        .login("admin@example.com", "secret")
        .await
        .expect("login should succeed");

    assert_eq!(response.user.email, "admin@example.com");
    assert_eq!(auth.token().as_deref(), Some("fresh"));
    assert_eq!(received(&server).await.len(), 1);
}

#[tokio::test]
async fn http_401_from_server_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(json_status(
            401,
            r#"{"code":401,"message":"invalid token","data":null}"#,
        ))
        .mount(&server)
        .await;
    let client = test_client(&server.uri());

    let err = client
        .list_sessions()
        .await
        .expect_err("401 should fail");

    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(!client.auth().is_authenticated());
    assert!(client.auth().take_login_required());
}

#[tokio::test]
async fn closed_port_is_a_transport_error() {
    let client = test_client(&format!("http://127.0.0.1:{}", closed_port()));

    let err = client
        .get_session("s1")
        .await
        .expect_err("connection should fail");

    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn server_url_trailing_slash_is_trimmed() {
    let client = test_client("http://localhost:8888/");

    assert_eq!(client.server_url(), "http://localhost:8888");
}
