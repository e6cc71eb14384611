use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::persistence::domain::job_service::JobServiceError;

/// Thin wrapper over a blocking reqwest client bound to one API base URL.
///
/// Turns transport failures and non-2xx answers into [`JobServiceError`],
/// preferring the server's own `message`/`error` field for the latter.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, JobServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobServiceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.get(self.url(path)))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.put(self.url(path)))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.post(self.url(path)))
    }

    /// Sends `request` and returns the response if its status is a success.
    pub fn send(&self, request: RequestBuilder) -> Result<Response, JobServiceError> {
        let response = request
            .send()
            .map_err(|e| JobServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(JobServiceError::Server {
            status: status.as_u16(),
            message: server_message(&body)
                .unwrap_or_else(|| fallback_message(status.as_u16(), &body)),
        })
    }

    /// Sends `request` and decodes a JSON body.
    pub fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, JobServiceError> {
        let body = self.send_text(request)?;
        serde_json::from_str(&body).map_err(|e| JobServiceError::InvalidResponse(e.to_string()))
    }

    pub fn send_text(&self, request: RequestBuilder) -> Result<String, JobServiceError> {
        self.send(request)?
            .text()
            .map_err(|e| JobServiceError::Transport(e.to_string()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Extracts `message` or `error` from a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("request failed with status {status}")
    } else {
        body.to_string()
    }
}
