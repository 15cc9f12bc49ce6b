//! Download, parsing and retry pipeline for the tesouro Treasury data downloader.
//!
//! This crate provides the data retrieval pipeline:
//!
//! - [`url::year_url`] - Constructs Treasury CDN URLs
//! - [`YearSource`] - One-attempt source of raw yearly files, [`HttpSource`] over the CDN
//! - [`DownloadClient`] - HTTP client with connection pooling
//! - [`parse_year_file`] - Versioned row schema parsers
//! - [`year_stream`] - Bounded concurrent per-year download stream
//! - [`Retriever`] - `get_data` and friends, returning ordered tables

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tesouro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod decode;
mod parse;
mod retriever;
mod retry;
mod source;
mod stream;
pub mod url;

pub use client::{DownloadClient, DownloadError};
pub use config::{DEFAULT_BASE_URL, ErrorPolicy, RetrieverConfig};
pub use decode::{Cell, Sheet, decode_delimited, decode_workbook};
pub use parse::{Layout, parse_date, parse_decimal, parse_sheet, parse_year_file};
pub use retriever::{BatchCollector, Retriever};
pub use retry::fetch_with_retry;
pub use source::{HttpSource, YearSource};
pub use stream::{YearBatch, year_stream};
