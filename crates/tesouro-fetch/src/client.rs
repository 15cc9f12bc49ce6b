//! HTTP client for downloading per-year history files.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::RetrieverConfig;

/// Errors of a single download attempt.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The attempt did not finish in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Server returned a 5xx or 429 status.
    #[error("Server error: {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// Server refused the request with a non-retryable status.
    #[error("Unexpected status: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Source temporarily unreachable.
    ///
    /// Not produced by [`DownloadClient`]; for custom
    /// [`YearSource`](crate::YearSource) implementations (mirrors, object
    /// stores) whose transient failures are not HTTP errors. Retried.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Source permanently refused the request.
    ///
    /// Not produced by [`DownloadClient`]; lets custom
    /// [`YearSource`](crate::YearSource) implementations stop retries early.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl DownloadError {
    /// Returns true if another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // Builder errors are configuration issues; body and decode errors
            // are connections dropped or truncated mid-transfer
            Self::Http(e) => {
                !e.is_builder()
                    && (e.is_timeout()
                        || e.is_connect()
                        || e.is_request()
                        || e.is_body()
                        || e.is_decode())
            }
            Self::Timeout(_) | Self::ServerError { .. } | Self::Unavailable(_) => true,
            Self::Status { .. } | Self::Rejected(_) => false,
        }
    }
}

/// HTTP client with connection pooling.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
}

impl DownloadClient {
    /// Creates a new download client from the retriever configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &RetrieverConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            // One idle connection per concurrent year fetch
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10).min(config.timeout()))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(&RetrieverConfig::default())
    }

    /// Downloads one file in a single attempt.
    ///
    /// Returns `Ok(None)` if the file does not exist (404).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// failure status.
    pub async fn download(&self, url: &str) -> Result<Option<Bytes>, DownloadError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None); // No file for this year
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
            });
        }

        Ok(Some(response.bytes().await?))
    }
}
