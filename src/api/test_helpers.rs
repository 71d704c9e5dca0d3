use serde_json::json;
use std::sync::Arc;
use wiremock::{MockServer, Request, ResponseTemplate};

use crate::api::{ApiClient, AuthSession};

pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("port bind should succeed");
    let port = listener
        .local_addr()
        .expect("listener local addr should exist")
        .port();
    drop(listener);
    port
}

/// `200` with `data` wrapped in the server's `{code, message, data}` envelope.
pub fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "message": "ok", "data": data }))
}

pub fn json_status(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
}

/// `text/event-stream` body made of the given raw frames, back to back.
pub fn event_stream(frames: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("cache-control", "no-cache")
        .set_body_raw(frames.concat(), "text/event-stream")
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
}

pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn body_text(request: &Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

pub fn test_client(server_url: &str) -> ApiClient {
    ApiClient::new(
        server_url,
        Arc::new(AuthSession::new(Some("test-token".to_string()))),
    )
}
