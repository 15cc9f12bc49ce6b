//! Decoding of raw source files into sheets of cells.

use bytes::Bytes;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use csv_async::AsyncReaderBuilder;
use futures::StreamExt;
use std::io::Cursor;
use tesouro_types::ParseError;

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No content.
    Empty,
    /// Trimmed, non-empty text.
    Text(String),
    /// Numeric cell.
    Number(f64),
    /// Date cell.
    Date(NaiveDate),
}

impl Cell {
    /// Creates a text cell, mapping blank text to [`Cell::Empty`].
    #[must_use]
    pub fn text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }

    /// Returns true if the cell has no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the cell rendered as text, for error messages and labels.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

/// A named grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name (the asset code for workbook sources).
    pub name: String,
    /// Row index of `rows[0]` within the original sheet.
    pub first_row: usize,
    /// Rows of cells.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Creates a sheet starting at row zero.
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            first_row: 0,
            rows,
        }
    }

    /// Returns true if every cell of the sheet is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Cell::is_empty))
    }
}

/// Decodes a legacy Excel workbook into one [`Sheet`] per worksheet.
///
/// # Errors
///
/// Returns [`ParseError::Undecodable`] if the bytes are not a workbook or a
/// worksheet cannot be read.
pub fn decode_workbook(bytes: Bytes) -> Result<Vec<Sheet>, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Undecodable("empty file".to_string()));
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ParseError::Undecodable(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ParseError::Undecodable(format!("sheet '{name}': {e}")))?;
        sheets.push(sheet_from_range(name, &range));
    }
    Ok(sheets)
}

/// Converts a worksheet range into a [`Sheet`].
pub(crate) fn sheet_from_range(name: String, range: &calamine::Range<Data>) -> Sheet {
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Sheet {
        name,
        first_row,
        rows,
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| Cell::Number(dt.as_f64()), |d| Cell::Date(d.date())),
        Data::Error(e) => Cell::Text(format!("{e}")),
    }
}

/// Decodes semicolon-delimited text into a single [`Sheet`].
///
/// # Errors
///
/// Returns [`ParseError::Undecodable`] if the text is not valid UTF-8 CSV.
pub async fn decode_delimited(bytes: Bytes, name: &str) -> Result<Sheet, ParseError> {
    let mut reader = AsyncReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .create_reader(bytes.as_ref());

    let mut rows = Vec::new();
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        let record = record.map_err(|e| ParseError::Undecodable(e.to_string()))?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(Sheet::new(name, rows))
}
