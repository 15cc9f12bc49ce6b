//! Row schema for each source format version.

use bytes::Bytes;
use chrono::{Datelike, NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;
use tesouro_types::{BondRecord, BondType, FormatVersion, ParseError};

use crate::decode::{Cell, Sheet, decode_delimited, decode_workbook};

/// Number of leading rows searched for the header.
const HEADER_SEARCH_ROWS: usize = 3;

/// Column positions and header labels of one format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Column holding the asset code, or `None` when the sheet name is the asset code.
    pub asset: Option<usize>,
    /// Reference date column.
    pub date: usize,
    /// Buy-side rate column.
    pub bid_yield: usize,
    /// Sell-side rate column.
    pub ask_yield: usize,
    /// Buy-side price column.
    pub bid_price: usize,
    /// Sell-side price column.
    pub ask_price: usize,
    /// Expected header label prefixes, one per leading column (accent and case insensitive).
    pub header: &'static [&'static str],
}

impl Layout {
    /// Workbook layout: `Dia | Taxa Compra | Taxa Venda | PU Compra | PU Venda | ...`.
    pub const XLS_V1: Self = Self {
        asset: None,
        date: 0,
        bid_yield: 1,
        ask_yield: 2,
        bid_price: 3,
        ask_price: 4,
        header: &["dia", "taxa", "taxa", "pu", "pu"],
    };

    /// Flat layout: `Titulo;Dia;Taxa Compra;Taxa Venda;PU Compra;PU Venda`.
    pub const CSV_V1: Self = Self {
        asset: Some(0),
        date: 1,
        bid_yield: 2,
        ask_yield: 3,
        bid_price: 4,
        ask_price: 5,
        header: &["titulo", "dia", "taxa", "taxa", "pu", "pu"],
    };

    /// Returns the layout of a format version.
    #[must_use]
    pub const fn of(format: FormatVersion) -> Self {
        match format {
            FormatVersion::XlsV1 => Self::XLS_V1,
            FormatVersion::CsvV1 => Self::CSV_V1,
        }
    }

    /// Minimum number of cells a data row must have.
    const fn min_columns(&self) -> usize {
        let mut max = self.date;
        if self.bid_yield > max {
            max = self.bid_yield;
        }
        if self.bid_price > max {
            max = self.bid_price;
        }
        max + 1
    }
}

/// Parses one downloaded `(bond type, year)` file with the given format version.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first place the file departs from
/// the layout of `format`.
pub async fn parse_year_file(
    format: FormatVersion,
    bytes: Bytes,
    bond_type: BondType,
    year: i32,
) -> Result<Vec<BondRecord>, ParseError> {
    match format {
        FormatVersion::XlsV1 => parse_xls_v1(bytes, bond_type).await,
        FormatVersion::CsvV1 => parse_csv_v1(bytes, bond_type, year).await,
    }
}

/// Parses a workbook with one sheet per issue.
async fn parse_xls_v1(bytes: Bytes, bond_type: BondType) -> Result<Vec<BondRecord>, ParseError> {
    // Workbook decoding is CPU bound, keep it off the async executor
    let sheets = tokio::task::spawn_blocking(move || decode_workbook(bytes))
        .await
        .map_err(|e| ParseError::Undecodable(format!("decoder task failed: {e}")))??;

    let mut records = Vec::new();
    for sheet in &sheets {
        records.extend(parse_sheet(sheet, &Layout::XLS_V1, bond_type)?);
    }
    Ok(records)
}

/// Parses semicolon-delimited text with one row per issue and date.
async fn parse_csv_v1(
    bytes: Bytes,
    bond_type: BondType,
    year: i32,
) -> Result<Vec<BondRecord>, ParseError> {
    let name = format!("{}_{year}", bond_type.file_stem());
    let sheet = decode_delimited(bytes, &name).await?;
    if sheet.is_blank() {
        return Err(ParseError::MissingHeader { sheet: name });
    }
    parse_sheet(&sheet, &Layout::CSV_V1, bond_type)
}

/// Converts the data rows of one sheet into records.
///
/// Blank sheets yield no records. Blank rows and rows whose buy-side price
/// is zero are skipped; any other departure from the layout is an error.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the sheet and row that does not conform.
pub fn parse_sheet(
    sheet: &Sheet,
    layout: &Layout,
    bond_type: BondType,
) -> Result<Vec<BondRecord>, ParseError> {
    if sheet.is_blank() {
        return Ok(Vec::new());
    }

    let header_idx = find_header(sheet, layout)?;
    let sheet_asset = bond_type.display_asset_code(&sheet.name);

    let mut records = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate().skip(header_idx + 1) {
        let row_no = sheet.first_row + idx;
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        if row.len() < layout.min_columns() {
            return Err(ParseError::MissingColumns {
                sheet: sheet.name.clone(),
                row: row_no,
                expected: layout.min_columns(),
                found: row.len(),
            });
        }

        let ctx = RowContext {
            sheet: &sheet.name,
            row: row_no,
        };

        let price = ctx.required_decimal(row, layout.bid_price, "price")?;
        if price.is_zero() {
            continue;
        }
        if price.is_sign_negative() {
            return Err(ctx.invalid("price", &row[layout.bid_price]));
        }

        let reference_date = ctx.date(row, layout.date)?;
        let yield_rate = ctx.required_decimal(row, layout.bid_yield, "yield")?;
        let ask_price = ctx
            .optional_decimal(row, layout.ask_price, "ask price")?
            .filter(|p| !p.is_zero());
        // A malformed sell-side rate is an error even when no sell price is quoted
        let ask_yield = ctx
            .optional_decimal(row, layout.ask_yield, "ask yield")?
            .filter(|_| ask_price.is_some());

        let asset_code = match layout.asset {
            Some(col) => match row.get(col) {
                Some(Cell::Text(code)) => bond_type.display_asset_code(code),
                Some(cell) => return Err(ctx.invalid("asset code", cell)),
                None => return Err(ctx.invalid("asset code", &Cell::Empty)),
            },
            None => sheet_asset.clone(),
        };

        let record = BondRecord::new(bond_type, asset_code, reference_date, price, yield_rate)
            .with_ask(ask_price, ask_yield);

        let before_inception = reference_date.year() < bond_type.first_year();
        let after_maturity = record.maturity.is_some_and(|m| reference_date > m);
        if before_inception || after_maturity {
            return Err(ParseError::OutsideTradingWindow {
                sheet: sheet.name.clone(),
                row: row_no,
                date: reference_date,
            });
        }

        records.push(record);
    }

    Ok(records)
}

/// Locates and validates the header row.
fn find_header(sheet: &Sheet, layout: &Layout) -> Result<usize, ParseError> {
    let first_label = layout.header[0];
    let idx = sheet
        .rows
        .iter()
        .take(HEADER_SEARCH_ROWS)
        .position(|row| {
            row.first()
                .is_some_and(|cell| fold_label(&cell.render()).starts_with(first_label))
        })
        .ok_or_else(|| ParseError::MissingHeader {
            sheet: sheet.name.clone(),
        })?;

    let row = &sheet.rows[idx];
    for (column, expected) in layout.header.iter().enumerate() {
        let found = row.get(column).map(Cell::render).unwrap_or_default();
        if !fold_label(&found).starts_with(expected) {
            return Err(ParseError::HeaderMismatch {
                sheet: sheet.name.clone(),
                column,
                expected: (*expected).to_string(),
                found,
            });
        }
    }
    Ok(idx)
}

/// Lowercases a label and strips Portuguese diacritics.
fn fold_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Location of a row, for error reporting.
struct RowContext<'a> {
    sheet: &'a str,
    row: usize,
}

impl RowContext<'_> {
    fn invalid(&self, column: &'static str, cell: &Cell) -> ParseError {
        ParseError::InvalidCell {
            sheet: self.sheet.to_string(),
            row: self.row,
            column,
            value: cell.render(),
        }
    }

    fn date(&self, row: &[Cell], col: usize) -> Result<NaiveDate, ParseError> {
        let cell = row.get(col).unwrap_or(&Cell::Empty);
        parse_date(cell).ok_or_else(|| self.invalid("date", cell))
    }

    fn required_decimal(
        &self,
        row: &[Cell],
        col: usize,
        column: &'static str,
    ) -> Result<Decimal, ParseError> {
        self.optional_decimal(row, col, column)?
            .ok_or_else(|| self.invalid(column, &Cell::Empty))
    }

    fn optional_decimal(
        &self,
        row: &[Cell],
        col: usize,
        column: &'static str,
    ) -> Result<Option<Decimal>, ParseError> {
        match row.get(col).unwrap_or(&Cell::Empty) {
            Cell::Empty => Ok(None),
            cell => parse_decimal(cell)
                .map(Some)
                .ok_or_else(|| self.invalid(column, cell)),
        }
    }
}

/// Parses a date cell: a date, an Excel serial number or `dd/mm/yyyy` text.
#[must_use]
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(s) => NaiveDate::parse_from_str(s, "%d/%m/%Y")
            .or_else(|_| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d"))
            .ok(),
        Cell::Empty => None,
    }
}

/// Converts an Excel serial day number (1900 date system) to a date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.fract() != 0.0 || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(TimeDelta::days(serial as i64))
}

/// Parses a numeric cell: a number or text in Brazilian (`1.234,56`) or plain (`1234.56`) notation.
///
/// Text without a decimal comma is plain notation unless its dots group
/// digits in threes (`1.234.567`). A lone dot before exactly three digits
/// (`1.234`) could be either notation and is rejected.
#[must_use]
pub fn parse_decimal(cell: &Cell) -> Option<Decimal> {
    match cell {
        // Shortest round-trip text keeps 812.34 from becoming 812.3400000000000318
        Cell::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| Decimal::from_f64(*n)),
        Cell::Text(s) => {
            let s = s.trim().trim_end_matches('%').trim();
            let normalized = if s.contains(',') {
                s.replace('.', "").replace(',', ".")
            } else {
                match s.matches('.').count() {
                    0 => s.to_string(),
                    1 if is_ambiguous_grouping(s) => return None,
                    1 => s.to_string(),
                    _ if is_thousands_grouping(s) => s.replace('.', ""),
                    _ => return None,
                }
            };
            Decimal::from_str(&normalized).ok()
        }
        Cell::Date(_) | Cell::Empty => None,
    }
}

/// True for `d.ddd` shapes where the dot may be a Brazilian thousands separator.
fn is_ambiguous_grouping(s: &str) -> bool {
    let digits = s.trim_start_matches(['-', '+']);
    let Some((int, frac)) = digits.split_once('.') else {
        return false;
    };
    !int.is_empty()
        && int.len() <= 3
        && !int.starts_with('0')
        && frac.len() == 3
        && int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit())
}

/// True for `d.ddd.ddd` shapes.
fn is_thousands_grouping(s: &str) -> bool {
    let digits = s.trim_start_matches(['-', '+']);
    let mut groups = digits.split('.');
    let lead_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    lead_ok && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}
