//! Retriever configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tesouro_types::{FormatVersion, TesouroError};

/// Default location of the Treasury's per-year history files.
pub const DEFAULT_BASE_URL: &str =
    "https://cdn.tesouro.gov.br/sistemas-internos/apex/producao/sistemas/sistd";

/// What to do when one year of a multi-year query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the first failure and abort the remaining fetches.
    #[default]
    FailFast,
    /// Let every fetch finish, then return the failure of the earliest year.
    CollectAll,
}

/// Configuration for the retriever and its HTTP source.
///
/// Every field has a default, so a JSON config file only needs to name the
/// options it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrieverConfig {
    /// Per-attempt timeout, in seconds.
    pub timeout_seconds: u64,
    /// Maximum retries after the first attempt of each year.
    pub max_retries: u32,
    /// Base URL of the source.
    pub base_url: String,
    /// Maximum concurrent year fetches.
    pub concurrency: usize,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
    /// Layout of the files served by the source.
    pub format: FormatVersion,
    /// Behavior when a year fails.
    pub error_policy: ErrorPolicy,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 4, // The CDN throttles bursts of parallel requests
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            user_agent: format!("tesouro/{}", env!("CARGO_PKG_VERSION")),
            format: FormatVersion::XlsV1,
            error_policy: ErrorPolicy::FailFast,
        }
    }
}

impl RetrieverConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, names an unknown option or
    /// holds invalid values.
    pub fn from_json(json: &str) -> Result<Self, TesouroError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TesouroError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TesouroError::InvalidArgument`] for a zero timeout, zero
    /// concurrency or an empty base URL.
    pub fn validate(&self) -> Result<(), TesouroError> {
        if self.timeout_seconds == 0 {
            return Err(TesouroError::InvalidArgument(
                "timeout_seconds must be positive".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(TesouroError::InvalidArgument(
                "concurrency must be positive".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(TesouroError::InvalidArgument(
                "base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Calculates the delay before retry number `attempt` (starting at 1).
    ///
    /// Exponential backoff capped at `max_delay_ms`, with a deterministic
    /// jitter of up to ±25% and a floor of `base_delay_ms`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: base_delay * 2^attempt
        let exp_delay = self.base_delay_ms.saturating_mul(1u64 << attempt.min(10));
        let capped = exp_delay.min(self.max_delay_ms) as i64;

        // Jitter derived from the attempt number, no RNG needed
        let jitter_range = capped / 4;
        let jitter = if jitter_range > 0 {
            (i64::from(attempt) * 17) % (jitter_range * 2) - jitter_range
        } else {
            0
        };

        let floor = self.base_delay_ms as i64;
        Duration::from_millis((capped + jitter).max(floor) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RetrieverConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.format, FormatVersion::XlsV1);
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            RetrieverConfig::from_json(r#"{"max_retries": 5, "format": "csv_v1"}"#).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.format, FormatVersion::CsvV1);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        assert!(RetrieverConfig::from_json(r#"{"retries": 5}"#).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = RetrieverConfig::from_json(r#"{"concurrency": 0}"#).unwrap_err();
        assert!(err.is_invalid_argument());
        let err = RetrieverConfig::from_json(r#"{"timeout_seconds": 0}"#).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_backoff_delay_calculation() {
        let config = RetrieverConfig::default();

        // First retry: base_delay * 2 = 1000ms (plus jitter)
        let delay1 = config.backoff_delay(1);
        assert!(delay1.as_millis() >= 750 && delay1.as_millis() <= 1250);

        // Second retry: base_delay * 4 = 2000ms (plus jitter)
        let delay2 = config.backoff_delay(2);
        assert!(delay2.as_millis() >= 1500 && delay2.as_millis() <= 2500);

        // High attempt should be capped at max_delay
        let delay_high = config.backoff_delay(20);
        assert!(delay_high.as_millis() <= 12_500); // max_delay + 25% jitter
    }

    #[test]
    fn test_backoff_floor() {
        let config = RetrieverConfig {
            base_delay_ms: 1,
            max_delay_ms: 1,
            ..Default::default()
        };
        assert_eq!(config.backoff_delay(3), Duration::from_millis(1));
    }
}
