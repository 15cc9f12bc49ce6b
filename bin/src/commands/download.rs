//! Download command implementation.
//!
//! This module resolves the requested bond types and years, downloads every
//! `(bond type, year)` file with a progress bar and writes the merged table.

use crate::display::{Format, default_output, write_table};
use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, Utc};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::MultiSelect;
use std::path::PathBuf;
use std::pin::pin;
use tesouro_lib::prelude::*;

/// Arguments of the download command.
pub(crate) struct DownloadArgs {
    pub(crate) bonds: Vec<String>,
    pub(crate) start: Option<i32>,
    pub(crate) end: Option<i32>,
    pub(crate) all: bool,
    pub(crate) output: Option<PathBuf>,
    pub(crate) format: Format,
    pub(crate) concurrency: Option<usize>,
    pub(crate) timeout: Option<u64>,
    pub(crate) max_retries: Option<u32>,
    pub(crate) base_url: Option<String>,
    pub(crate) config: Option<PathBuf>,
}

impl DownloadArgs {
    /// Builds the retriever configuration: file (or defaults), then flags.
    fn retriever_config(&self) -> Result<RetrieverConfig> {
        let mut config = match &self.config {
            Some(path) => RetrieverConfig::from_file(path)
                .with_context(|| format!("Invalid config file: {}", path.display()))?,
            None => RetrieverConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Returns `(start, end)`, defaulting end to the current year and start to end.
    fn years(&self, current_year: i32) -> (i32, i32) {
        let end = self.end.unwrap_or(current_year);
        (self.start.unwrap_or(end), end)
    }
}

/// Parses bond codes, or picks all of them, or asks interactively.
fn resolve_bonds(codes: &[String], all: bool, quiet: bool) -> Result<Vec<BondType>> {
    if all {
        return Ok(BondType::all().to_vec());
    }
    if !codes.is_empty() {
        return codes
            .iter()
            .map(|code| code.parse::<BondType>().map_err(|e| anyhow!("{e}")))
            .collect();
    }
    if quiet {
        bail!("No bond types given (pass codes or --all)");
    }

    let registry = BondRegistry::global();
    let options: Vec<String> = registry
        .all()
        .map(|info| format!("{} | {}", info.bond_type(), info.name()))
        .collect();

    let selection = MultiSelect::new("Select bond types to download:", options)
        .prompt()
        .context("Bond selection cancelled")?;

    let bonds = selection
        .iter()
        .map(|choice| {
            choice
                .split(" | ")
                .next()
                .context("Failed to parse bond selection")?
                .parse::<BondType>()
                .map_err(|e| anyhow!("{e}"))
        })
        .collect::<Result<Vec<_>>>()?;

    if bonds.is_empty() {
        bail!("No bond types selected");
    }
    Ok(bonds)
}

/// Download history for the requested bond types and years.
pub(crate) async fn download(args: DownloadArgs, quiet: bool) -> Result<()> {
    let bond_types = resolve_bonds(&args.bonds, args.all, quiet)?;
    let (start, end) = args.years(Utc::now().year());

    let ranges = bond_types
        .iter()
        .map(|bond| QueryRange::new(*bond, start, end))
        .collect::<Result<Vec<_>, _>>()?;

    let config = args.retriever_config()?;
    let policy = config.error_policy;
    let retriever = Retriever::new(config).context("Failed to create retriever")?;

    // Determine output path (default to <bond>.<format>)
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output(&bond_types, args.format)));

    // Setup progress bar
    let total_files: usize = ranges.iter().map(QueryRange::total_years).sum();
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total_files as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
                .context("Invalid progress template")?
                .progress_chars("=>-"),
        );
        pb.set_message(format!("{start}-{end}"));
        pb
    };

    let mut collector = BatchCollector::new(policy);
    let mut stream = pin!(retriever.year_stream_many(&ranges));

    while let Some(result) = stream.next().await {
        progress.inc(1);
        if let Ok(batch) = &result {
            progress.set_message(format!("{} {}", batch.bond_type, batch.year));
        }
        if let Err(e) = collector.push(result) {
            progress.abandon_with_message("failed");
            return Err(e).context("Download failed");
        }
    }

    let table = match collector.finish() {
        Ok(table) => table,
        Err(e) => {
            progress.abandon_with_message("failed");
            return Err(e).context("Download failed");
        }
    };
    progress.finish_with_message(format!("Downloaded {} records", table.len()));

    write_table(&table, &output, args.format)?;

    if !quiet {
        if let (Some(first), Some(last)) = (table.first_date(), table.last_date()) {
            println!(
                "{} records from {first} to {last}, {} issues",
                table.len(),
                table.asset_codes().len()
            );
        }
        println!("Output written to: {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DownloadArgs {
        DownloadArgs {
            bonds: vec![],
            start: None,
            end: None,
            all: false,
            output: None,
            format: Format::Csv,
            concurrency: None,
            timeout: None,
            max_retries: None,
            base_url: None,
            config: None,
        }
    }

    #[test]
    fn test_year_defaults() {
        assert_eq!(args().years(2024), (2024, 2024));
        let a = DownloadArgs {
            end: Some(2021),
            ..args()
        };
        assert_eq!(a.years(2024), (2021, 2021));
        let a = DownloadArgs {
            start: Some(2019),
            ..args()
        };
        assert_eq!(a.years(2024), (2019, 2024));
    }

    #[test]
    fn test_resolve_bonds() {
        let codes = vec!["ltn".to_string(), "NTN-B Principal".to_string()];
        assert_eq!(
            resolve_bonds(&codes, false, true).unwrap(),
            vec![BondType::Ltn, BondType::NtnBPrincipal]
        );
        assert_eq!(resolve_bonds(&[], true, true).unwrap().len(), 6);
        assert!(resolve_bonds(&["XYZ".to_string()], false, true).is_err());
        assert!(resolve_bonds(&[], false, true).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tesouro.json");
        std::fs::write(&path, r#"{"max_retries": 7, "timeout_seconds": 5}"#).unwrap();

        let a = DownloadArgs {
            config: Some(path),
            timeout: Some(60),
            base_url: Some("http://mirror.local".to_string()),
            ..args()
        };
        let config = a.retriever_config().unwrap();
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.base_url, "http://mirror.local");
    }

    #[test]
    fn test_invalid_flag_value_is_rejected() {
        let a = DownloadArgs {
            concurrency: Some(0),
            ..args()
        };
        assert!(a.retriever_config().is_err());
    }
}
