//! Treasury CDN URL construction.

use tesouro_types::{BondType, FormatVersion};

pub use crate::config::DEFAULT_BASE_URL;

/// Builds the URL of one `(bond type, year)` history file.
///
/// URL format: `{base_url}/{YEAR}/{FILE_STEM}_{YEAR}.{EXT}`
///
/// # Example
///
/// ```
/// use tesouro_fetch::url::{DEFAULT_BASE_URL, year_url};
/// use tesouro_types::{BondType, FormatVersion};
///
/// let url = year_url(DEFAULT_BASE_URL, BondType::NtnBPrincipal, 2020, FormatVersion::XlsV1);
/// assert!(url.ends_with("/2020/NTN_B_Principal_2020.xls"));
/// ```
#[must_use]
pub fn year_url(base_url: &str, bond_type: BondType, year: i32, format: FormatVersion) -> String {
    format!(
        "{}/{year}/{}_{year}.{}",
        base_url.trim_end_matches('/'),
        bond_type.file_stem(),
        format.extension()
    )
}
