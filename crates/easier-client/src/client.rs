use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::session::Session;

/// Address of a locally running service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// One HTTP client bound to the service's base URL.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Build a client for `base_url`. Without a `timeout` requests use
    /// reqwest's defaults.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.to_string(),
        })
    }

    /// Absolute URL of `path` (which starts with `/`).
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.endpoint(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.endpoint(path))
    }

    /// Attach the session's bearer token.
    pub fn authorized(
        &self,
        request: RequestBuilder,
        session: &Session,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(request.bearer_auth(session.bearer()?))
    }

    /// Send `request` and fail on any non-success status.
    ///
    /// Resolves once response headers arrive; the body is read separately
    /// with [`ServiceClient::read_json`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body)
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
        warn!(status = status.as_u16(), message = %message, "request rejected");

        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Read the response body as JSON.
    pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// [`ServiceClient::send`] followed by [`ServiceClient::read_json`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Self::read_json(response).await
    }
}

/// Pull a readable message out of an error body.
///
/// The service reports failures as `{"detail": "..."}`; request validation
/// failures carry a list of objects with a `msg` field instead.
fn error_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}
