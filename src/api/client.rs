//! HTTP client for the capture backend's connections endpoint.
//!
//! Issues `GET /api/connections?half=<bool>` and decodes the connection list.

use crate::api::models::Connection;
use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

/// Longest error body kept in an [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Failure while listing connections.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    /// The body was not a list of connections
    #[error("invalid connections payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the connections endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionsClient {
    /// HTTP client for API requests
    client: Client,
    /// Backend base URL without trailing slash
    base_url: String,
}

impl ConnectionsClient {
    /// Create a new client from configuration.
    ///
    /// # Arguments
    /// * `config` - Application configuration
    ///
    /// # Returns
    /// * `Result<ConnectionsClient>` - New client or error
    ///
    /// # Details
    /// Requires a non-empty, parseable `base_url`.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(anyhow::anyhow!(
                "Backend base URL is required. Please set base_url in config.jsonc or pass --url"
            ));
        }
        Url::parse(base_url).with_context(|| format!("Invalid backend URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the connections listing for the given `half` flag.
    pub fn connections_url(&self, half: bool) -> String {
        format!("{}/api/connections?half={}", self.base_url, half)
    }

    /// Fetch connections from the backend.
    ///
    /// # Arguments
    /// * `half` - Whether half-connections should be included
    ///
    /// # Returns
    /// * `Result<Vec<Connection>, ApiError>` - Connection list or error
    pub async fn fetch_connections(&self, half: bool) -> Result<Vec<Connection>, ApiError> {
        let url = self.connections_url(half);
        tracing::debug!(%url, "fetching connections");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Request {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                body: error_message(&body),
            });
        }

        let connections: Vec<Connection> = serde_json::from_str(&body)?;
        tracing::debug!(count = connections.len(), half, "fetched connections");
        Ok(connections)
    }
}

/// Extract a short error message from a failure body.
///
/// # Details
/// Uses the `error` field of a JSON object when present, otherwise the
/// trimmed body, cut to [`MAX_ERROR_BODY`] characters.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    message.chars().take(MAX_ERROR_BODY).collect()
}
