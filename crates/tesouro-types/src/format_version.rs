//! Source file layout versions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tagged layout of the files served by the source.
///
/// Each version maps to exactly one parsing function, so a file that does
/// not match its declared layout is reported as a parse error instead of
/// being read field by field on a best-effort basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatVersion {
    /// Legacy Excel workbook with one sheet per issue, as served by the Treasury CDN.
    #[default]
    XlsV1,
    /// Semicolon-delimited text with one row per issue and date.
    CsvV1,
}

impl FormatVersion {
    /// Returns the file extension used in source URLs.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::XlsV1 => "xls",
            Self::CsvV1 => "csv",
        }
    }

    /// Returns the version as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::XlsV1 => "xls_v1",
            Self::CsvV1 => "csv_v1",
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FormatVersion {
    type Err = crate::TesouroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xls_v1" | "xls" => Ok(Self::XlsV1),
            "csv_v1" | "csv" => Ok(Self::CsvV1),
            _ => Err(crate::TesouroError::InvalidArgument(format!(
                "unknown source format '{s}', expected xls_v1 or csv_v1"
            ))),
        }
    }
}
