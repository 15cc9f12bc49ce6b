//! List command implementation.
//!
//! This module handles listing bond types with optional filtering.

use anyhow::{Result, anyhow};
use tesouro_lib::{BondRegistry, Indexer};

/// List bond types with optional indexer filter or search pattern.
pub(crate) fn list_bonds(indexer: Option<&str>, search: Option<&str>) -> Result<()> {
    let registry = BondRegistry::global();

    let bonds: Vec<_> = match (indexer, search) {
        (Some(idx), _) => {
            let indexer: Indexer = idx.parse().map_err(|e: String| anyhow!(e))?;
            registry.by_indexer(indexer).collect()
        }
        (_, Some(pattern)) => registry.search(pattern),
        (None, None) => registry.all().collect(),
    };

    if bonds.is_empty() {
        println!("No bond types found.");
        return Ok(());
    }

    println!(
        "{:<17} {:<40} {:<10} {:<6} {:<7}",
        "CODE", "NAME", "INDEXER", "SINCE", "COUPONS"
    );
    println!("{}", "-".repeat(84));

    for info in &bonds {
        println!(
            "{:<17} {:<40} {:<10} {:<6} {:<7}",
            info.bond_type().code(),
            info.name(),
            info.indexer(),
            info.first_year(),
            if info.semiannual_coupons() { "yes" } else { "no" }
        );
    }

    println!("\nTotal: {} bond types", bonds.len());
    Ok(())
}
