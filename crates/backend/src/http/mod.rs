//! `reqwest` adapter for the quiz server's JSON API.

mod catalog;
mod quiz;
mod upload;
mod wire;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::BackendError;
use wire::ErrorBody;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Quiz, catalog and upload backend reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Connection` if the HTTP client cannot be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message())
            .unwrap_or(body);
        tracing::debug!(status = status.as_u16(), %detail, "backend rejected request");
        Err(status_error(status, detail))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::Serialization(err.to_string())
    } else {
        BackendError::Connection(err.to_string())
    }
}

fn status_error(status: StatusCode, detail: String) -> BackendError {
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(detail),
        StatusCode::CONFLICT => BackendError::Conflict(detail),
        other => BackendError::Rejected {
            status: other.as_u16(),
            detail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, "gone".into()),
            BackendError::NotFound("gone".into())
        );
        assert_eq!(
            status_error(StatusCode::CONFLICT, "dup".into()),
            BackendError::Conflict("dup".into())
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            BackendError::Rejected {
                status: 500,
                detail: "boom".into()
            }
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new(HttpBackendConfig::new("http://quiz.local:8000/")).unwrap();
        assert_eq!(backend.base_url(), "http://quiz.local:8000");
        assert_eq!(backend.url("/api/quiz/count"), "http://quiz.local:8000/api/quiz/count");
    }
}
