//! Platform API client for the e-commerce platform.
//!
//! Covers the remote entities this extension provisions and flips: boolean
//! user-attribute definitions, conditional user groups, cart promotions, and
//! the catalog/configuration reads behind the admin surface.
//!
//! # Authentication
//!
//! Every call carries `Authorization: Bearer <token>`. The token is read per
//! request from the platform session store (the platform SDK refreshes it out
//! of band), so it is a method argument rather than client state.

mod attributes;
mod catalog;
mod promotions;
mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::PlatformConfig;

/// Errors that can occur when interacting with the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unauthorized (expired or invalid session token).
    #[error("Unauthorized: invalid session token")]
    Unauthorized,
}

/// Platform API client.
///
/// Cheaply cloneable; the underlying HTTP client and base URL are shared.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    /// Create a new platform API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(PlatformClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The configured base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Execute a GET request against the platform API.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
    ) -> Result<T, PlatformError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self
            .inner
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a POST request against the platform API.
    pub(crate) async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Execute a PUT request against the platform API.
    pub(crate) async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<T, PlatformError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self
            .inner
            .client
            .put(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PlatformError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse error response from the platform API.
    async fn parse_error(&self, response: reqwest::Response) -> PlatformError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return PlatformError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return PlatformError::Unauthorized;
        }

        if status == 404 {
            return PlatformError::NotFound("Resource not found".to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        PlatformError::Api { status, message }
    }
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
