//! JSON output format.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use tesouro_types::{BondRecord, BondType, ResultTable};

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// How prices and rates are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalStyle {
    /// Exact decimal text, e.g. `"812.34"`.
    #[default]
    String,
    /// JSON numbers. Values are rounded to the nearest `f64`.
    Number,
}

/// One record as written to JSON.
#[derive(Serialize)]
struct JsonRecord<'a> {
    reference_date: NaiveDate,
    bond_type: BondType,
    asset_code: &'a str,
    maturity: Option<NaiveDate>,
    price: JsonDecimal,
    yield_rate: JsonDecimal,
    ask_price: Option<JsonDecimal>,
    ask_yield: Option<JsonDecimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price_spread: Option<JsonDecimal>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonDecimal {
    Text(String),
    Number(f64),
}

impl JsonDecimal {
    fn new(value: Decimal, style: DecimalStyle) -> Self {
        match style {
            DecimalStyle::String => Self::Text(value.to_string()),
            // Parsing the decimal text rounds correctly to the nearest f64
            DecimalStyle::Number => {
                let text = value.to_string();
                text.parse().map_or(Self::Text(text), Self::Number)
            }
        }
    }
}

/// JSON formatter.
///
/// Prices and rates are written as strings by default so no precision is
/// lost; see [`DecimalStyle`].
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    style: JsonStyle,
    pretty: bool,
    decimals: DecimalStyle,
    include_spread: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
            decimals: DecimalStyle::String,
            include_spread: false,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self::new().with_style(JsonStyle::Ndjson)
    }

    /// Sets whether to pretty-print output (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets how prices and rates are written.
    #[must_use]
    pub const fn with_decimals(mut self, decimals: DecimalStyle) -> Self {
        self.decimals = decimals;
        self
    }

    /// Adds a `price_spread` field (buy minus sell price) to records quoting both sides.
    #[must_use]
    pub const fn with_spread(mut self, include: bool) -> Self {
        self.include_spread = include;
        self
    }

    fn shape<'a>(&self, record: &'a BondRecord) -> JsonRecord<'a> {
        let decimal = |value: Decimal| JsonDecimal::new(value, self.decimals);
        JsonRecord {
            reference_date: record.reference_date,
            bond_type: record.bond_type,
            asset_code: &record.asset_code,
            maturity: record.maturity,
            price: decimal(record.price),
            yield_rate: decimal(record.yield_rate),
            ask_price: record.ask_price.map(decimal),
            ask_yield: record.ask_yield.map(decimal),
            price_spread: if self.include_spread {
                record.price_spread().map(decimal)
            } else {
                None
            },
        }
    }
}

impl Formatter for JsonFormatter {
    fn write_table<W: Write + Send>(
        &self,
        table: &ResultTable,
        mut writer: W,
    ) -> Result<(), FormatError> {
        let records = table.iter().map(|record| self.shape(record));
        match self.style {
            JsonStyle::Array => {
                let records: Vec<_> = records.collect();
                if self.pretty {
                    serde_json::to_writer_pretty(&mut writer, &records)?;
                } else {
                    serde_json::to_writer(&mut writer, &records)?;
                }
                writeln!(writer)?;
            }
            JsonStyle::Ndjson => {
                for record in records {
                    serde_json::to_writer(&mut writer, &record)?;
                    writeln!(writer)?;
                }
            }
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}
