//! CSV output format.

use ::csv::WriterBuilder;
use std::fmt::Display;
use std::io::Write;
use tesouro_types::ResultTable;

use crate::{FormatError, Formatter};

const HEADER: [&str; 8] = [
    "reference_date",
    "bond_type",
    "asset_code",
    "maturity",
    "price",
    "yield_rate",
    "ask_price",
    "ask_yield",
];

/// CSV formatter.
///
/// Fields containing the delimiter, quotes or line breaks are quoted.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Field delimiter (default: comma).
    delimiter: u8,
    /// Whether to include header row.
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a new CSV formatter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: b',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated values (TSV) formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            include_header: true,
        }
    }
}

/// Renders an optional value, empty when absent.
fn opt<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Formatter for CsvFormatter {
    fn write_table<W: Write + Send>(
        &self,
        table: &ResultTable,
        writer: W,
    ) -> Result<(), FormatError> {
        let mut csv = WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        if self.include_header {
            csv.write_record(HEADER)?;
        }

        for record in table {
            csv.write_record([
                record.reference_date.format("%Y-%m-%d").to_string(),
                record.bond_type.to_string(),
                record.asset_code.clone(),
                opt(record.maturity.map(|m| m.format("%Y-%m-%d"))),
                record.price.to_string(),
                record.yield_rate.to_string(),
                opt(record.ask_price),
                opt(record.ask_yield),
            ])?;
        }

        csv.flush()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == b'\t' { "tsv" } else { "csv" }
    }
}
