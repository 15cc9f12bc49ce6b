//! Per-year retry loop.

use bytes::Bytes;
use tesouro_types::{BondType, TesouroError};
use tracing::{debug, warn};

use crate::{DownloadError, RetrieverConfig, YearSource};

/// Fetches one year's file, retrying retryable failures with backoff.
///
/// Makes at most `max_retries + 1` attempts, each bounded by the configured
/// timeout.
///
/// # Errors
///
/// Returns [`TesouroError::SourceUnavailable`] once the retries are exhausted
/// or the failure is not retryable.
pub async fn fetch_with_retry<S: YearSource + ?Sized>(
    source: &S,
    config: &RetrieverConfig,
    bond_type: BondType,
    year: i32,
) -> Result<Option<Bytes>, TesouroError> {
    let timeout = config.timeout();
    let mut attempts = 0;

    loop {
        attempts += 1;
        debug!(bond = %bond_type, year, attempt = attempts, "fetching year file");

        let result = tokio::time::timeout(timeout, source.fetch(bond_type, year))
            .await
            .unwrap_or(Err(DownloadError::Timeout(timeout)));

        match result {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.is_retryable() && attempts <= config.max_retries => {
                let delay = config.backoff_delay(attempts);
                warn!(
                    bond = %bond_type,
                    year,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(TesouroError::SourceUnavailable {
                    bond_type,
                    year,
                    attempts,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with the given error a fixed number of times, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        retryable: bool,
    }

    #[async_trait]
    impl YearSource for Flaky {
        async fn fetch(&self, _: BondType, _: i32) -> Result<Option<Bytes>, DownloadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                if self.retryable {
                    Err(DownloadError::ServerError { status: 503 })
                } else {
                    Err(DownloadError::Status { status: 403 })
                }
            } else {
                Ok(Some(Bytes::from_static(b"ok")))
            }
        }
    }

    /// Never answers.
    struct Hanging;

    #[async_trait]
    impl YearSource for Hanging {
        async fn fetch(&self, _: BondType, _: i32) -> Result<Option<Bytes>, DownloadError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    fn fast_config(max_retries: u32) -> RetrieverConfig {
        RetrieverConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let source = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
            retryable: true,
        };
        let bytes = fetch_with_retry(&source, &fast_config(3), BondType::Ltn, 2020)
            .await
            .unwrap();
        assert_eq!(bytes, Some(Bytes::from_static(b"ok")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let source = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            retryable: true,
        };
        let err = fetch_with_retry(&source, &fast_config(2), BondType::Ltn, 2021)
            .await
            .unwrap_err();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        match err {
            TesouroError::SourceUnavailable { year, attempts, .. } => {
                assert_eq!(year, 2021);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let source = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            retryable: false,
        };
        let err = fetch_with_retry(&source, &fast_config(5), BondType::Ltn, 2020)
            .await
            .unwrap_err();
        assert!(err.is_source_unavailable());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_failure() {
        let config = RetrieverConfig {
            timeout_seconds: 1,
            ..fast_config(1)
        };
        let err = fetch_with_retry(&Hanging, &config, BondType::Lft, 2020)
            .await
            .unwrap_err();
        match err {
            TesouroError::SourceUnavailable {
                attempts, reason, ..
            } => {
                assert_eq!(attempts, 2);
                assert!(reason.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
