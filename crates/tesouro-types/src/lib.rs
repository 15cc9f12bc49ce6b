//! Core types for the tesouro Treasury data downloader.
//!
//! This crate provides the fundamental data structures used throughout tesouro:
//!
//! - [`BondType`] - The enumerated set of Tesouro Direto bond types
//! - [`BondRecord`] - One daily price/yield observation for a bond issue
//! - [`QueryRange`] - Validated bond type and inclusive year range
//! - [`ResultTable`] - Records ordered by reference date
//! - [`FormatVersion`] - Tagged layout of source files
//! - [`TesouroError`] - Error taxonomy shared by all crates

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tesouro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bond_type;
mod error;
mod format_version;
mod query_range;
mod record;
mod table;

pub use bond_type::{BondType, BondTypeParseError, FIRST_YEAR};
pub use error::{ParseError, Result, TesouroError};
pub use format_version::FormatVersion;
pub use query_range::QueryRange;
pub use record::{BondRecord, maturity_from_asset_code};
pub use table::ResultTable;

/// Exact decimal type used for prices and rates.
pub use rust_decimal::Decimal;

/// Returns the codes of all supported bond types.
#[must_use]
pub fn available_bond_types() -> Vec<&'static str> {
    BondType::all().iter().map(BondType::code).collect()
}
