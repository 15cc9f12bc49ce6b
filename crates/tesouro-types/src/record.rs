//! Bond price/yield record representation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BondType;

/// One daily price and yield observation for a single bond issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondRecord {
    /// Bond type of the issue.
    pub bond_type: BondType,
    /// Issue identifier, e.g. `LTN 010123`.
    pub asset_code: String,
    /// Maturity date of the issue, when it can be read from the asset code.
    pub maturity: Option<NaiveDate>,
    /// Date the observation applies to.
    pub reference_date: NaiveDate,
    /// Buy-side unit price in BRL ("PU Compra").
    pub price: Decimal,
    /// Buy-side annualized rate ("Taxa Compra").
    pub yield_rate: Decimal,
    /// Sell-side unit price ("PU Venda"), if published.
    pub ask_price: Option<Decimal>,
    /// Sell-side annualized rate ("Taxa Venda"), if published.
    pub ask_yield: Option<Decimal>,
}

impl BondRecord {
    /// Creates a record with buy-side values only.
    #[must_use]
    pub fn new(
        bond_type: BondType,
        asset_code: impl Into<String>,
        reference_date: NaiveDate,
        price: Decimal,
        yield_rate: Decimal,
    ) -> Self {
        let asset_code = asset_code.into();
        let maturity = maturity_from_asset_code(&asset_code);
        Self {
            bond_type,
            asset_code,
            maturity,
            reference_date,
            price,
            yield_rate,
            ask_price: None,
            ask_yield: None,
        }
    }

    /// Sets the sell-side values.
    #[must_use]
    pub const fn with_ask(mut self, ask_price: Option<Decimal>, ask_yield: Option<Decimal>) -> Self {
        self.ask_price = ask_price;
        self.ask_yield = ask_yield;
        self
    }

    /// Returns the bid/ask price spread, if the sell side is published.
    #[must_use]
    pub fn price_spread(&self) -> Option<Decimal> {
        self.ask_price.map(|ask| self.price - ask)
    }

    /// Returns the number of calendar days until maturity, if known.
    #[must_use]
    pub fn days_to_maturity(&self) -> Option<i64> {
        self.maturity
            .map(|m| (m - self.reference_date).num_days())
    }
}

/// Extracts the maturity date from the trailing `ddmmyy` of an asset code.
///
/// Two-digit years up to 50 are taken as 20yy, the rest as 19yy.
#[must_use]
pub fn maturity_from_asset_code(asset_code: &str) -> Option<NaiveDate> {
    let compact: String = asset_code.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = compact.as_bytes();
    if bytes.len() < 6 {
        return None;
    }
    let tail = &bytes[bytes.len() - 6..];
    if !tail.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // A seventh trailing digit means the tail is not a ddmmyy stamp.
    if bytes.len() > 6 && bytes[bytes.len() - 7].is_ascii_digit() {
        return None;
    }

    let pair = |i: usize| u32::from(tail[i] - b'0') * 10 + u32::from(tail[i + 1] - b'0');
    let day = pair(0);
    let month = pair(2);
    let yy = i32::try_from(pair(4)).ok()?;
    let year = if yy <= 50 { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year, month, day)
}
