//! Request client for the remote inventory API.
//!
//! Every endpoint answers with the same envelope:
//! `{ "success": bool, "data": ..., "error": "...", "message": "..." }`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    /// First non-empty of `error` and `message`, else empty.
    fn failure_message(&self) -> String {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// HTTP client for one remote API base URL.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    /// Create a client whose requests time out after `timeout`.
    ///
    /// * `base_url` - e.g. `https://inventory.example.com/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/{path}?{params}` and unwrap the envelope's `data`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(self.url(path))
            .query(params)
            .send()
            .await?;
        Self::parse_envelope(path, response).await
    }

    /// `POST {base}/{path}` with a JSON body and unwrap the envelope's `data`.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::parse_envelope(path, response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn parse_envelope<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                path: path.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope = match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(RemoteError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(err) => return Err(RemoteError::Decode(err.to_string())),
        };

        if !envelope.success || !status.is_success() {
            let message = envelope.failure_message();
            tracing::warn!(path, status = status.as_u16(), error = %message, "Remote call failed");
            return Err(RemoteError::Failure { message });
        }
        envelope
            .data
            .ok_or_else(|| RemoteError::Decode(format!("{path}: envelope has no data")))
    }
}
