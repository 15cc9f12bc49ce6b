//! Rust library for downloading Brazilian Treasury (Tesouro Direto) bond history.
//!
//! This is a facade crate that re-exports functionality from the tesouro
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use tesouro_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let retriever = Retriever::with_defaults()?;
//!     let table = retriever.get_data("NTN-B Principal", 2020, 2021).await?;
//!
//!     for record in &table {
//!         println!("{} {} {}", record.reference_date, record.asset_code, record.yield_rate);
//!     }
//!
//!     CsvFormatter::new().write_table(&table, std::io::stdout())?;
//!     Ok(())
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tesouro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use tesouro_types::*;

// Re-export bond registry
pub use tesouro_bonds::{BondInfo, BondRegistry, Indexer};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use tesouro_fetch::{
    BatchCollector, DEFAULT_BASE_URL, DownloadClient, DownloadError, ErrorPolicy, HttpSource,
    Retriever, RetrieverConfig, YearBatch, YearSource, url::year_url,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use tesouro_format::{
    CsvFormatter, DecimalStyle, FormatError, Formatter, JsonFormatter, JsonStyle, OutputFormat,
};

#[cfg(all(feature = "format", feature = "parquet"))]
pub use tesouro_format::ParquetFormatter;

/// Prelude module for convenient imports.
///
/// ```
/// use tesouro_lib::prelude::*;
/// ```
pub mod prelude {
    pub use tesouro_types::{
        BondRecord, BondType, FormatVersion, QueryRange, Result, ResultTable, TesouroError,
        available_bond_types,
    };

    pub use tesouro_bonds::BondRegistry;

    #[cfg(feature = "fetch")]
    pub use tesouro_fetch::{
        BatchCollector, ErrorPolicy, Retriever, RetrieverConfig, YearBatch, YearSource,
    };

    #[cfg(feature = "format")]
    pub use tesouro_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};

    #[cfg(all(feature = "format", feature = "parquet"))]
    pub use tesouro_format::ParquetFormatter;
}
