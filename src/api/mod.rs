use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

mod auth;
pub mod stream;
pub mod types;

pub use auth::AuthSession;
pub use stream::{StreamEvent, StreamHandle, StreamPhase, StreamUpdate, spawn_chat_stream};
pub use types::{
    Agent, ChatSession, Envelope, LoginRequest, LoginResponse, MessageContent, PersistedMessage,
    Role, Run, RunStatus, RunStep, SendChatRequest,
};

#[cfg(test)]
mod client_test;
#[cfg(test)]
pub(crate) mod test_helpers;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("{message} (code {code})")]
    Business { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    server_url: String,
    auth: Arc<AuthSession>,
}

impl ApiClient {
    pub fn new(server_url: &str, auth: Arc<AuthSession>) -> Self {
        Self {
            http_client: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        self.handle_response(response).await
    }

    /// Like `get`, but a `null` payload is read as an empty list.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        let data: serde_json::Value = self.handle_response(response).await?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(data)
            .map_err(|err| ApiError::Transport(format!("unexpected payload for {path}: {err}")))
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        self.handle_response(response).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        self.get_list("/api/sessions").await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession, ApiError> {
        self.get(&format!("/api/sessions/{session_id}")).await
    }

    pub async fn list_session_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<PersistedMessage>, ApiError> {
        self.get_list(&format!("/api/sessions/{session_id}/messages"))
            .await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, ApiError> {
        self.get(&format!("/api/agents/{agent_id}")).await
    }

    pub async fn list_runs(&self) -> Result<Vec<Run>, ApiError> {
        self.get_list("/api/runs").await
    }

    pub async fn get_run_trace(&self, run_id: &str) -> Result<Vec<RunStep>, ApiError> {
        self.get_list(&format!("/api/runs/{run_id}/trace")).await
    }

    /// Logs in and stores the access token for every later request.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/api/auth/login", &request).await?;
        if response.access_token.is_empty() {
            return Err(ApiError::Transport(
                "login response is missing access_token".to_string(),
            ));
        }
        self.auth.set_token(response.access_token.clone());
        Ok(response)
    }

    /// Non-streaming send. Blocks until the agent has answered and returns the
    /// created assistant message.
    pub async fn send_message(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<PersistedMessage, ApiError> {
        let request = SendChatRequest {
            content: content.to_string(),
        };
        self.post(&format!("/api/sessions/{session_id}/chat"), &request)
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, format!("{}{}", self.server_url, path));
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        let data = self.unwrap_envelope(status, &body)?;
        serde_json::from_value(data)
            .map_err(|err| ApiError::Transport(format!("unexpected payload: {err}")))
    }

    /// Maps a raw response onto the error taxonomy and returns the envelope's `data`.
    pub(crate) fn unwrap_envelope(
        &self,
        status: StatusCode,
        body: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let envelope = serde_json::from_str::<Envelope>(body);

        if status == StatusCode::UNAUTHORIZED {
            let message = envelope
                .ok()
                .map(|envelope| envelope.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "Unauthorized".to_string());
            self.auth.handle_unauthorized();
            return Err(ApiError::Unauthorized { message });
        }

        match envelope {
            Ok(envelope) if envelope.code != 0 => Err(ApiError::Business {
                code: envelope.code,
                message: envelope.message,
            }),
            Ok(envelope) if status.is_success() => Ok(envelope.data),
            Ok(_) => Err(ApiError::Transport(format!(
                "request failed with status {status}"
            ))),
            Err(_) if !status.is_success() => Err(ApiError::Transport(format!(
                "request failed with status {status}"
            ))),
            Err(err) => Err(ApiError::Transport(format!(
                "malformed response body: {err}"
            ))),
        }
    }
}
