//! Error types for tesouro.

use thiserror::Error;

use crate::BondType;

/// Result type alias for tesouro operations.
pub type Result<T> = std::result::Result<T, TesouroError>;

/// Errors that can occur while retrieving and normalizing bond data.
#[derive(Error, Debug)]
pub enum TesouroError {
    /// The caller passed an unknown bond type or an invalid year range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The source could not be reached for one year after all retries.
    #[error("Source unavailable for {bond_type} {year} after {attempts} attempt(s): {reason}")]
    SourceUnavailable {
        /// The bond type being fetched.
        bond_type: BondType,
        /// The year whose file could not be fetched.
        year: i32,
        /// Number of attempts made, including the first one.
        attempts: u32,
        /// Description of the last failure.
        reason: String,
    },

    /// The downloaded file does not match the expected row schema.
    #[error("Parse error in {bond_type} {year}: {source}")]
    Parse {
        /// The bond type being parsed.
        bond_type: BondType,
        /// The year whose file failed to parse.
        year: i32,
        /// What did not match.
        #[source]
        source: ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output format error.
    #[error("Format error: {0}")]
    Format(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TesouroError {
    /// Returns true if this error was caused by the caller's input.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns true if this error means the source could not be reached.
    #[must_use]
    pub const fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }

    /// Returns true if this error signals a change in the source's file layout.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns the year a fetch or parse failure refers to.
    #[must_use]
    pub const fn year(&self) -> Option<i32> {
        match self {
            Self::SourceUnavailable { year, .. } | Self::Parse { year, .. } => Some(*year),
            _ => None,
        }
    }
}

/// Schema mismatches detected while parsing a source file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file could not be decoded at all.
    #[error("undecodable file: {0}")]
    Undecodable(String),

    /// A sheet has no header row.
    #[error("sheet '{sheet}' has no header row")]
    MissingHeader {
        /// Sheet name.
        sheet: String,
    },

    /// The header row does not have the expected columns.
    #[error("sheet '{sheet}' header mismatch at column {column}: expected '{expected}', found '{found}'")]
    HeaderMismatch {
        /// Sheet name.
        sheet: String,
        /// Zero-based column index.
        column: usize,
        /// Expected label prefix.
        expected: String,
        /// Label found in the file.
        found: String,
    },

    /// A row does not have enough columns.
    #[error("sheet '{sheet}' row {row}: expected {expected} columns, found {found}")]
    MissingColumns {
        /// Sheet name.
        sheet: String,
        /// Zero-based row index within the sheet.
        row: usize,
        /// Minimum column count.
        expected: usize,
        /// Column count found.
        found: usize,
    },

    /// A cell could not be converted to the column's type.
    #[error("sheet '{sheet}' row {row}: invalid {column} value '{value}'")]
    InvalidCell {
        /// Sheet name.
        sheet: String,
        /// Zero-based row index within the sheet.
        row: usize,
        /// Column name.
        column: &'static str,
        /// Raw cell content.
        value: String,
    },

    /// A record falls outside the bond's trading window.
    #[error("sheet '{sheet}' row {row}: reference date {date} outside trading window")]
    OutsideTradingWindow {
        /// Sheet name.
        sheet: String,
        /// Zero-based row index within the sheet.
        row: usize,
        /// The offending reference date.
        date: chrono::NaiveDate,
    },
}
