//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawlers, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Transport-level retries for connection and timeout failures
//! - Error classification into the harvesting taxonomy
//!
//! Status codes are never retried here. A throttling response is reported to
//! the caller as [`FetchError::Throttled`] so that the crawler can apply its
//! ban cooldown.

use crate::config::HttpConfig;
use crate::ErrorKind;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified failure of a single network call
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered 503; the crawler should back off
    #[error("{url} is throttling requests (HTTP 503)")]
    Throttled { url: String },

    /// Connection, timeout or unexpected status
    #[error("request to {url} failed: {message}")]
    Transient { url: String, message: String },

    /// The response arrived but its body is unusable
    #[error("unusable response from {url}: {message}")]
    Malformed { url: String, message: String },

    /// The request target itself is invalid
    #[error("invalid request target: {0}")]
    ConfigFatal(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Throttled { .. } => ErrorKind::Throttled,
            Self::Transient { .. } => ErrorKind::Transient,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::ConfigFatal(_) => ErrorKind::ConfigFatal,
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    pub(crate) fn malformed(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Malformed {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain GET retrieval shared by the network-backed crawlers
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry_count: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry_count: config.retry_count,
            retry_delay: Duration::from_millis(config.retry_delay),
        })
    }

    /// Fetches the raw body of `url`
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_with_query(url, &[]).await
    }

    /// Fetches `url` with query parameters and decodes the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let body = self.get_with_query(url, query).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::malformed(url, e))
    }

    /// Sends a GET request, retrying transport failures up to the configured count
    ///
    /// # Error classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Unparseable URL | `ConfigFatal` |
    /// | HTTP 503 | `Throttled` |
    /// | Other non-2xx | `Transient` |
    /// | Timeout / connection refused | retried, then `Transient` |
    /// | Body read failure | `Transient` |
    pub async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, FetchError> {
        let target =
            Url::parse(url).map_err(|e| FetchError::ConfigFatal(format!("{}: {}", url, e)))?;

        let mut attempt = 0;
        loop {
            let mut request = self.client.get(target.clone());
            if !query.is_empty() {
                request = request.query(query);
            }

            match request.send().await {
                Ok(response) => return read_response(url, response).await,
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.retry_count => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} after transport error ({}/{}): {}",
                        url,
                        attempt,
                        self.retry_count,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    return Err(FetchError::Transient {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}

async fn read_response(url: &str, response: Response) -> Result<Vec<u8>, FetchError> {
    let status = response.status();

    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(FetchError::Throttled {
            url: url.to_string(),
        });
    }

    if !status.is_success() {
        return Err(FetchError::Transient {
            url: url.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    response
        .bytes()
        .await
        .map(|body| body.to_vec())
        .map_err(|e| FetchError::Transient {
            url: url.to_string(),
            message: e.to_string(),
        })
}
