//! Shared HTTP client for the backend adapters.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::ApiError;
use crate::storage::{Storage, keys};

/// Longest response body excerpt carried in an error.
const ERROR_BODY_LIMIT: usize = 200;
/// Longest response body excerpt written to the log.
const LOG_BODY_LIMIT: usize = 500;

/// HTTP client bound to one base URL.
///
/// Attaches `Authorization: Bearer <token>` to every request when a token is
/// stored. The token is read from storage per request, so a sign-in or
/// sign-out takes effect on the next call without rebuilding the client.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn Storage>,
}

impl HttpClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("shelfmark/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpClientInner {
                client,
                base_url,
                storage,
            }),
        })
    }

    /// Resolve a relative endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not form a valid URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Start a request to `url`, attaching the stored bearer token if any.
    #[must_use]
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn bearer_token(&self) -> Option<String> {
        match self.inner.storage.get(keys::AUTH_TOKEN) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read auth token; sending request without it");
                None
            }
        }
    }

    /// Send a request and decode a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-success status or
    /// an undecodable body.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body may be empty or `null`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute`].
    pub async fn execute_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let body = self.send(request).await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        serde_json::from_str(&body).map(Some).map_err(|e| {
            error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and ignore the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout or non-success status.
    pub async fn execute_discard(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(drop)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let path = response.url().path().to_string();

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(classify)?;

        if status.is_success() {
            debug!(status = %status, path = %path, "Backend request succeeded");
            return Ok(body);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = %status, path = %path, "Backend rejected credentials");
                Err(ApiError::Unauthorized(status.as_u16()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            _ => {
                error!(
                    status = %status,
                    path = %path,
                    body = %truncate(&body, LOG_BODY_LIMIT),
                    "Backend returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: truncate(&body, ERROR_BODY_LIMIT),
                })
            }
        }
    }
}

fn classify(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Http(e)
    }
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
