//! Treasury bond type definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Year Tesouro Direto started selling bonds to the public.
pub const FIRST_YEAR: i32 = 2002;

/// Category of Brazilian Treasury security sold through Tesouro Direto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BondType {
    /// Selic-indexed floating rate note (Tesouro Selic).
    #[serde(rename = "LFT")]
    Lft,
    /// Fixed-rate zero coupon bill (Tesouro Prefixado).
    #[serde(rename = "LTN")]
    Ltn,
    /// IGP-M linked note with semiannual coupons.
    #[serde(rename = "NTN-C")]
    NtnC,
    /// IPCA linked note with semiannual coupons (Tesouro IPCA+ com Juros Semestrais).
    #[serde(rename = "NTN-B")]
    NtnB,
    /// IPCA linked zero coupon note (Tesouro IPCA+).
    #[serde(rename = "NTN-B Principal")]
    NtnBPrincipal,
    /// Fixed-rate note with semiannual coupons (Tesouro Prefixado com Juros Semestrais).
    #[serde(rename = "NTN-F")]
    NtnF,
}

impl BondType {
    /// Returns the display code, as used in asset codes (`NTN-B Principal 150535`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Lft => "LFT",
            Self::Ltn => "LTN",
            Self::NtnC => "NTN-C",
            Self::NtnB => "NTN-B",
            Self::NtnBPrincipal => "NTN-B Principal",
            Self::NtnF => "NTN-F",
        }
    }

    /// Returns the file name stem used by the Treasury CDN (`NTN_B_Principal`).
    #[must_use]
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::Lft => "LFT",
            Self::Ltn => "LTN",
            Self::NtnC => "NTN_C",
            Self::NtnB => "NTN_B",
            Self::NtnBPrincipal => "NTN_B_Principal",
            Self::NtnF => "NTN_F",
        }
    }

    /// Returns the first calendar year the bond type traded on Tesouro Direto.
    #[must_use]
    pub const fn first_year(&self) -> i32 {
        match self {
            Self::NtnBPrincipal => 2005,
            _ => FIRST_YEAR,
        }
    }

    /// Returns all bond types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Lft,
            Self::Ltn,
            Self::NtnC,
            Self::NtnB,
            Self::NtnBPrincipal,
            Self::NtnF,
        ]
    }

    /// Rewrites an asset code taken from a source file into display spelling.
    ///
    /// Sheet names follow the file stem spelling (`NTN_B_Principal 150535`,
    /// `NTN-F_010127`); the result uses the display code and a single space
    /// before the maturity (`NTN-B Principal 150535`).
    #[must_use]
    pub fn display_asset_code(&self, raw: &str) -> String {
        let raw = raw.trim();
        let normalized = normalize_code(raw);
        let stem = normalize_code(self.code());

        match normalized.strip_prefix(&stem) {
            Some(rest) => {
                let suffix = rest.trim_start_matches('_');
                if suffix.is_empty() {
                    self.code().to_string()
                } else {
                    format!("{} {}", self.code(), suffix.replace('_', " "))
                }
            }
            None => raw.replace('_', " "),
        }
    }
}

/// Uppercases and collapses `-`, `_` and whitespace into `_`.
fn normalize_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.extend(c.to_uppercase());
        }
    }
    out
}

impl std::fmt::Display for BondType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for BondType {
    type Err = BondTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_code(s.trim()).as_str() {
            "LFT" => Ok(Self::Lft),
            "LTN" => Ok(Self::Ltn),
            "NTN_C" => Ok(Self::NtnC),
            "NTN_B" => Ok(Self::NtnB),
            "NTN_B_PRINCIPAL" => Ok(Self::NtnBPrincipal),
            "NTN_F" => Ok(Self::NtnF),
            _ => Err(BondTypeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown bond type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondTypeParseError(String);

impl std::fmt::Display for BondTypeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown bond type '{}', expected one of: LFT, LTN, NTN-C, NTN-B, NTN-B Principal, NTN-F",
            self.0
        )
    }
}

impl std::error::Error for BondTypeParseError {}

impl From<BondTypeParseError> for crate::TesouroError {
    fn from(err: BondTypeParseError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
