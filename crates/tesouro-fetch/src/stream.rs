//! Concurrent per-year download pipeline.

use futures::stream::{self, Stream, StreamExt};
use tesouro_types::{BondRecord, BondType, QueryRange, TesouroError};
use tracing::{debug, info};

use crate::{RetrieverConfig, YearSource, parse::parse_year_file, retry::fetch_with_retry};

/// The records of one `(bond type, year)` file.
#[derive(Debug, Clone)]
pub struct YearBatch {
    /// The bond type.
    pub bond_type: BondType,
    /// The calendar year.
    pub year: i32,
    /// Records of that year inside the query range, in file order.
    pub records: Vec<BondRecord>,
}

impl YearBatch {
    /// Creates a new year batch.
    #[must_use]
    pub const fn new(bond_type: BondType, year: i32, records: Vec<BondRecord>) -> Self {
        Self {
            bond_type,
            year,
            records,
        }
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }
}

/// Creates an async stream of year batches for the given query ranges.
///
/// Years are fetched, retried and parsed concurrently, with at most
/// `config.concurrency` files in flight. Batches arrive in completion
/// order, not year order.
pub fn year_stream<'a, S: YearSource + ?Sized>(
    source: &'a S,
    config: &'a RetrieverConfig,
    ranges: &[QueryRange],
) -> impl Stream<Item = Result<YearBatch, TesouroError>> + use<'a, S> {
    let jobs: Vec<(QueryRange, i32)> = ranges
        .iter()
        .flat_map(|range| range.years().map(move |year| (*range, year)))
        .collect();

    stream::iter(jobs)
        .map(move |(range, year)| fetch_year(source, config, range, year))
        .buffer_unordered(config.concurrency)
}

/// Downloads and parses one year, keeping the records inside `range`.
async fn fetch_year<S: YearSource + ?Sized>(
    source: &S,
    config: &RetrieverConfig,
    range: QueryRange,
    year: i32,
) -> Result<YearBatch, TesouroError> {
    let bond_type = range.bond_type;

    let Some(bytes) = fetch_with_retry(source, config, bond_type, year).await? else {
        info!(bond = %bond_type, year, "no file for year");
        return Ok(YearBatch::new(bond_type, year, Vec::new()));
    };

    let parsed = parse_year_file(config.format, bytes, bond_type, year)
        .await
        .map_err(|source| TesouroError::Parse {
            bond_type,
            year,
            source,
        })?;

    let total = parsed.len();
    let records: Vec<BondRecord> = parsed
        .into_iter()
        .filter(|r| range.contains(r.reference_date))
        .collect();
    if records.len() < total {
        debug!(
            bond = %bond_type,
            year,
            dropped = total - records.len(),
            "records outside query range"
        );
    }

    info!(bond = %bond_type, year, records = records.len(), "year complete");
    Ok(YearBatch::new(bond_type, year, records))
}
