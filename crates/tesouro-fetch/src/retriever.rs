//! The caller-facing retriever.

use futures::{Stream, StreamExt};
use std::pin::pin;
use tesouro_types::{BondRecord, BondType, QueryRange, ResultTable, TesouroError};
use tracing::{error, info};

use crate::{
    ErrorPolicy, HttpSource, RetrieverConfig, YearSource,
    stream::{YearBatch, year_stream},
};

/// Downloads, normalizes and orders bond history for year ranges.
///
/// The retriever holds no state between calls apart from its configuration
/// and the source's connection pool; every call returns a fresh table.
///
/// # Example
///
/// ```no_run
/// use tesouro_fetch::Retriever;
///
/// # async fn run() -> tesouro_types::Result<()> {
/// let retriever = Retriever::with_defaults()?;
/// let table = retriever.get_data("LTN", 2020, 2021).await?;
/// for record in &table {
///     println!("{} {} {}", record.reference_date, record.asset_code, record.price);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Retriever<S = HttpSource> {
    source: S,
    config: RetrieverConfig,
}

impl Retriever<HttpSource> {
    /// Creates a retriever over the Treasury CDN.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: RetrieverConfig) -> Result<Self, TesouroError> {
        config.validate()?;
        let source = HttpSource::new(&config)?;
        Ok(Self { source, config })
    }

    /// Creates a retriever with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, TesouroError> {
        Self::new(RetrieverConfig::default())
    }
}

impl<S: YearSource> Retriever<S> {
    /// Creates a retriever over a custom source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_source(source: S, config: RetrieverConfig) -> Result<Self, TesouroError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Returns the source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Retrieves every record of `bond_type` dated within
    /// `[start_year-01-01, end_year-12-31]`, ordered by reference date.
    ///
    /// # Errors
    ///
    /// - [`TesouroError::InvalidArgument`] for an unknown bond type or an
    ///   invalid year range.
    /// - [`TesouroError::SourceUnavailable`] if a year could not be fetched.
    /// - [`TesouroError::Parse`] if a year's file does not match the
    ///   configured format version.
    pub async fn get_data(
        &self,
        bond_type: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<ResultTable, TesouroError> {
        let bond_type: BondType = bond_type.parse()?;
        let range = QueryRange::new(bond_type, start_year, end_year)?;
        self.query(range).await
    }

    /// Retrieves several bond types over the same years as one table.
    ///
    /// # Errors
    ///
    /// Same as [`Retriever::get_data`]. An empty `bond_types` slice is an
    /// invalid argument.
    pub async fn get_many(
        &self,
        bond_types: &[BondType],
        start_year: i32,
        end_year: i32,
    ) -> Result<ResultTable, TesouroError> {
        if bond_types.is_empty() {
            return Err(TesouroError::InvalidArgument(
                "no bond types requested".to_string(),
            ));
        }
        let ranges = bond_types
            .iter()
            .map(|bond_type| QueryRange::new(*bond_type, start_year, end_year))
            .collect::<Result<Vec<_>, _>>()?;
        self.query_many(&ranges).await
    }

    /// Retrieves an already validated range.
    ///
    /// # Errors
    ///
    /// See [`Retriever::get_data`].
    pub async fn query(&self, range: QueryRange) -> Result<ResultTable, TesouroError> {
        self.query_many(&[range]).await
    }

    /// Retrieves several validated ranges as one table.
    ///
    /// # Errors
    ///
    /// See [`Retriever::get_data`].
    pub async fn query_many(&self, ranges: &[QueryRange]) -> Result<ResultTable, TesouroError> {
        for range in ranges {
            info!(range = %range, "querying");
        }

        // Returning early drops the stream, which cancels in-flight fetches
        let mut collector = BatchCollector::new(self.config.error_policy);
        let mut stream = pin!(self.year_stream_many(ranges));
        while let Some(result) = stream.next().await {
            collector.push(result)?;
        }
        let table = collector.finish()?;
        info!(records = table.len(), "query complete");
        Ok(table)
    }

    /// Streams the per-year batches of one range as they complete.
    pub fn year_stream(
        &self,
        range: QueryRange,
    ) -> impl Stream<Item = Result<YearBatch, TesouroError>> + use<'_, S> {
        year_stream(&self.source, &self.config, &[range])
    }

    /// Streams the per-year batches of several ranges through one bounded pool.
    pub fn year_stream_many(
        &self,
        ranges: &[QueryRange],
    ) -> impl Stream<Item = Result<YearBatch, TesouroError>> + use<'_, S> {
        year_stream(&self.source, &self.config, ranges)
    }
}

/// Folds per-year results into a table under an [`ErrorPolicy`].
///
/// Under [`ErrorPolicy::FailFast`], [`push`](Self::push) returns the first
/// failure. Under [`ErrorPolicy::CollectAll`], failures are logged and kept,
/// and [`finish`](Self::finish) returns the one of the earliest year.
#[derive(Debug)]
pub struct BatchCollector {
    policy: ErrorPolicy,
    records: Vec<BondRecord>,
    failures: Vec<TesouroError>,
}

impl BatchCollector {
    /// Creates an empty collector.
    #[must_use]
    pub const fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Adds one year's result.
    ///
    /// # Errors
    ///
    /// Returns the failure itself under [`ErrorPolicy::FailFast`].
    pub fn push(&mut self, result: Result<YearBatch, TesouroError>) -> Result<(), TesouroError> {
        match result {
            Ok(batch) => self.records.extend(batch.records),
            Err(e) if self.policy == ErrorPolicy::CollectAll => {
                error!(error = %e, "year failed");
                self.failures.push(e);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Returns the number of failures kept so far.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.len()
    }

    /// Returns the sorted table, or the failure of the earliest year.
    ///
    /// # Errors
    ///
    /// Returns the earliest kept failure, if any.
    pub fn finish(self) -> Result<ResultTable, TesouroError> {
        match self
            .failures
            .into_iter()
            .min_by_key(|e| e.year().unwrap_or(i32::MAX))
        {
            Some(e) => Err(e),
            None => Ok(ResultTable::from_unsorted(self.records)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tesouro_types::ParseError;

    fn unavailable(year: i32) -> TesouroError {
        TesouroError::SourceUnavailable {
            bond_type: BondType::Ltn,
            year,
            attempts: 1,
            reason: "down".to_string(),
        }
    }

    #[test]
    fn test_collect_all_returns_earliest_failure() {
        let mut collector = BatchCollector::new(ErrorPolicy::CollectAll);
        collector.push(Ok(YearBatch::new(BondType::Ltn, 2020, vec![]))).unwrap();
        collector.push(Err(unavailable(2023))).unwrap();
        collector
            .push(Err(TesouroError::Parse {
                bond_type: BondType::Ltn,
                year: 2021,
                source: ParseError::Undecodable("bad".to_string()),
            }))
            .unwrap();
        assert_eq!(collector.failures(), 2);

        let err = collector.finish().unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.year(), Some(2021));
    }

    #[test]
    fn test_fail_fast_returns_first_failure() {
        let mut collector = BatchCollector::new(ErrorPolicy::FailFast);
        collector.push(Ok(YearBatch::new(BondType::Ltn, 2021, vec![]))).unwrap();
        let err = collector.push(Err(unavailable(2023))).unwrap_err();
        assert_eq!(err.year(), Some(2023));
    }

    #[test]
    fn test_collector_sorts_records() {
        let record = |day: u32, code: &str| {
            BondRecord::new(
                BondType::Ltn,
                code.to_string(),
                chrono::NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
            )
        };
        let mut collector = BatchCollector::new(ErrorPolicy::CollectAll);
        collector
            .push(Ok(YearBatch::new(BondType::Ltn, 2020, vec![record(3, "LTN 010123")])))
            .unwrap();
        collector
            .push(Ok(YearBatch::new(BondType::Ltn, 2020, vec![record(2, "LTN 010125"), record(2, "LTN 010123")])))
            .unwrap();

        let table = collector.finish().unwrap();
        let keys: Vec<_> = table.iter().map(|r| (r.reference_date.day0(), r.asset_code.as_str())).collect();
        assert_eq!(keys, vec![(1, "LTN 010123"), (1, "LTN 010125"), (2, "LTN 010123")]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RetrieverConfig {
            concurrency: 0,
            ..Default::default()
        };
        let err = Retriever::new(config).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
