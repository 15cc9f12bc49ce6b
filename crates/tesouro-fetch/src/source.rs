//! Where per-year files come from.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tesouro_types::{BondType, FormatVersion, TesouroError};

use crate::{DownloadClient, DownloadError, RetrieverConfig, url::year_url};

/// A source of raw `(bond type, year)` files.
///
/// Each call is a single attempt; retries, timeouts and backoff are applied
/// by the retriever on top of it.
#[async_trait]
pub trait YearSource: Send + Sync {
    /// Fetches the raw file for one bond type and year.
    ///
    /// Returns `Ok(None)` when the source has no file for that year.
    async fn fetch(&self, bond_type: BondType, year: i32) -> Result<Option<Bytes>, DownloadError>;
}

#[async_trait]
impl<S: YearSource + ?Sized> YearSource for Arc<S> {
    async fn fetch(&self, bond_type: BondType, year: i32) -> Result<Option<Bytes>, DownloadError> {
        (**self).fetch(bond_type, year).await
    }
}

/// The Treasury CDN (or a mirror with the same URL scheme) over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: DownloadClient,
    base_url: String,
    format: FormatVersion,
}

impl HttpSource {
    /// Creates an HTTP source from the retriever configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TesouroError::Client`] if the HTTP client cannot be created.
    pub fn new(config: &RetrieverConfig) -> Result<Self, TesouroError> {
        let client = DownloadClient::new(config).map_err(|e| TesouroError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            format: config.format,
        })
    }

    /// Returns the URL fetched for one bond type and year.
    #[must_use]
    pub fn url(&self, bond_type: BondType, year: i32) -> String {
        year_url(&self.base_url, bond_type, year, self.format)
    }
}

#[async_trait]
impl YearSource for HttpSource {
    async fn fetch(&self, bond_type: BondType, year: i32) -> Result<Option<Bytes>, DownloadError> {
        self.client.download(&self.url(bond_type, year)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_source_url() {
        let config = RetrieverConfig {
            base_url: "http://mirror.local/td/".to_string(),
            format: FormatVersion::CsvV1,
            ..Default::default()
        };
        let source = HttpSource::new(&config).unwrap();
        assert_eq!(
            source.url(BondType::Lft, 2019),
            "http://mirror.local/td/2019/LFT_2019.csv"
        );
    }
}
