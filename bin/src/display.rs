//! Display utilities and output formatting for the tesouro CLI.

#[cfg(not(feature = "parquet"))]
use anyhow::bail;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tesouro_lib::prelude::*;

/// Output format for downloaded data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
    Parquet,
}

impl Format {
    /// Returns the file extension for this format.
    pub(crate) const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Default output path: the bond's file stem for one bond, `tesouro` otherwise.
pub(crate) fn default_output(bond_types: &[BondType], format: Format) -> String {
    match bond_types {
        [bond] => format!("{}.{}", bond.file_stem(), format.extension()),
        _ => format!("tesouro.{}", format.extension()),
    }
}

/// Write a table to a file in the specified format.
pub(crate) fn write_table(table: &ResultTable, output: &Path, format: Format) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        Format::Csv => CsvFormatter::new().write_table(table, &mut writer)?,
        Format::Json => JsonFormatter::new().write_table(table, &mut writer)?,
        Format::Ndjson => JsonFormatter::ndjson().write_table(table, &mut writer)?,
        Format::Parquet => {
            #[cfg(feature = "parquet")]
            {
                ParquetFormatter::new().write_table(table, &mut writer)?;
            }
            #[cfg(not(feature = "parquet"))]
            {
                bail!("Parquet support not compiled in");
            }
        }
    }

    writer.flush()?;
    Ok(())
}
