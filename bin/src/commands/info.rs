//! Info command implementation.
//!
//! This module displays registry details for one bond type along with the
//! source files of its most recent years.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use tesouro_lib::{BondRegistry, DEFAULT_BASE_URL, FormatVersion, year_url};

/// Number of recent years whose source URLs are shown.
const RECENT_YEARS: i32 = 3;

/// Show detailed information about a bond type.
pub(crate) fn show_info(code: &str) -> Result<()> {
    let registry = BondRegistry::global();
    let info = registry
        .get(code)
        .with_context(|| format!("Unknown bond type: {code}"))?;
    let bond = info.bond_type();

    println!("Bond:        {}", info.name());
    println!("Code:        {}", bond.code());
    println!("Indexer:     {}", info.indexer());
    println!("Coupons:     {}", if info.semiannual_coupons() { "semiannual" } else { "none" });
    println!("Description: {}", info.description());
    println!("Data Available From: {}", info.first_year());

    let current = Utc::now().year();
    let first = (current - RECENT_YEARS + 1).max(info.first_year());

    println!("\nSource Files:");
    for year in (first..=current).rev() {
        println!(
            "  {year}  {}",
            year_url(DEFAULT_BASE_URL, bond, year, FormatVersion::XlsV1)
        );
    }

    Ok(())
}
