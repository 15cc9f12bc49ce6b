//! Apache Parquet output format.

use arrow::array::{ArrayRef, Date32Array, Decimal128Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use tesouro_types::{BondRecord, ResultTable};

use crate::{FormatError, Formatter};

/// Precision of decimal columns.
const DECIMAL_PRECISION: u8 = 28;
/// Scale of decimal columns.
const DECIMAL_SCALE: i8 = 6;
/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parquet formatter.
#[derive(Debug, Clone)]
pub struct ParquetFormatter {
    /// Row group size (number of rows per group).
    row_group_size: usize,
    /// Compression codec.
    compression: Compression,
}

impl Default for ParquetFormatter {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
            compression: Compression::SNAPPY,
        }
    }
}

impl ParquetFormatter {
    /// Creates a new Parquet formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row group size.
    #[must_use]
    pub const fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Sets the compression codec.
    #[must_use]
    pub const fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Creates the Arrow schema for bond records.
    fn record_schema() -> Schema {
        let decimal = DataType::Decimal128(DECIMAL_PRECISION, DECIMAL_SCALE);
        Schema::new(vec![
            Field::new("reference_date", DataType::Date32, false),
            Field::new("bond_type", DataType::Utf8, false),
            Field::new("asset_code", DataType::Utf8, false),
            Field::new("maturity", DataType::Date32, true),
            Field::new("price", decimal.clone(), false),
            Field::new("yield_rate", decimal.clone(), false),
            Field::new("ask_price", decimal.clone(), true),
            Field::new("ask_yield", decimal, true),
        ])
    }

    /// Converts records to an Arrow RecordBatch.
    fn records_to_batch(records: &[BondRecord]) -> Result<RecordBatch, FormatError> {
        let dates: Vec<_> = records.iter().map(|r| date32(r.reference_date)).collect();
        let bond_types: Vec<_> = records.iter().map(|r| r.bond_type.code()).collect();
        let assets: Vec<_> = records.iter().map(|r| r.asset_code.as_str()).collect();
        let maturities: Vec<_> = records.iter().map(|r| r.maturity.map(date32)).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from(dates)),
            Arc::new(StringArray::from(bond_types)),
            Arc::new(StringArray::from(assets)),
            Arc::new(Date32Array::from(maturities)),
            decimal_column(records.iter().map(|r| Some(r.price)))?,
            decimal_column(records.iter().map(|r| Some(r.yield_rate)))?,
            decimal_column(records.iter().map(|r| r.ask_price))?,
            decimal_column(records.iter().map(|r| r.ask_yield))?,
        ];

        RecordBatch::try_new(Arc::new(Self::record_schema()), columns)
            .map_err(|e| FormatError::Parquet(e.to_string()))
    }
}

/// Days since the Unix epoch.
fn date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Builds a `Decimal128(28, 6)` column.
fn decimal_column(values: impl Iterator<Item = Option<Decimal>>) -> Result<ArrayRef, FormatError> {
    let mantissas: Vec<Option<i128>> = values
        .map(|value| {
            value.map(|mut d| {
                d.rescale(DECIMAL_SCALE as u32);
                d.mantissa()
            })
        })
        .collect();

    let array = Decimal128Array::from(mantissas)
        .with_precision_and_scale(DECIMAL_PRECISION, DECIMAL_SCALE)
        .map_err(|e| FormatError::Parquet(e.to_string()))?;
    Ok(Arc::new(array))
}

impl Formatter for ParquetFormatter {
    fn write_table<W: Write + Send>(
        &self,
        table: &ResultTable,
        writer: W,
    ) -> Result<(), FormatError> {
        let schema = Arc::new(Self::record_schema());
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut arrow_writer = ArrowWriter::try_new(writer, schema, Some(props))
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        // Write in batches
        for chunk in table.records().chunks(self.row_group_size) {
            let batch = Self::records_to_batch(chunk)?;
            arrow_writer
                .write(&batch)
                .map_err(|e| FormatError::Parquet(e.to_string()))?;
        }

        arrow_writer
            .close()
            .map_err(|e| FormatError::Parquet(e.to_string()))?;

        Ok(())
    }

    fn extension(&self) -> &str {
        "parquet"
    }
}
