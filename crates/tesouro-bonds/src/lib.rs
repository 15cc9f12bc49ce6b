//! Bond type registry for the tesouro Treasury data downloader.
//!
//! This crate provides the public names and indexing details of every bond
//! type sold through Tesouro Direto.
//!
//! # Example
//!
//! ```
//! use tesouro_bonds::BondRegistry;
//!
//! let registry = BondRegistry::global();
//!
//! // Lookup by code
//! if let Some(info) = registry.get("ntn-b") {
//!     println!("{}: {}", info.name(), info.indexer());
//! }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tesouro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tesouro_types::BondType;

/// The bond metadata JSON embedded at compile time.
const BONDS_JSON: &str = include_str!("../data/bonds.json");

/// Global bond registry instance.
static REGISTRY: OnceLock<BondRegistry> = OnceLock::new();

/// Index a bond's principal is adjusted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indexer {
    /// Fixed rate, no adjustment.
    Prefixado,
    /// Selic overnight rate.
    Selic,
    /// IPCA consumer price index.
    Ipca,
    /// IGP-M general price index.
    Igpm,
}

impl Indexer {
    /// Returns the indexer as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prefixado => "prefixado",
            Self::Selic => "selic",
            Self::Ipca => "ipca",
            Self::Igpm => "igpm",
        }
    }
}

impl std::fmt::Display for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Indexer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefixado" | "fixed" => Ok(Self::Prefixado),
            "selic" => Ok(Self::Selic),
            "ipca" => Ok(Self::Ipca),
            "igpm" | "igp-m" => Ok(Self::Igpm),
            _ => Err(format!(
                "Unknown indexer: {s}. Valid options: prefixado, selic, ipca, igpm"
            )),
        }
    }
}

/// Descriptive metadata for a bond type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondInfo {
    bond_type: BondType,
    name: String,
    description: String,
    indexer: Indexer,
    semiannual_coupons: bool,
    first_year: i32,
}

impl BondInfo {
    /// Returns the bond type.
    #[must_use]
    pub const fn bond_type(&self) -> BondType {
        self.bond_type
    }

    /// Returns the public (retail) name, e.g. "Tesouro Prefixado".
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the indexer.
    #[must_use]
    pub const fn indexer(&self) -> Indexer {
        self.indexer
    }

    /// Returns true if the bond pays semiannual coupons.
    #[must_use]
    pub const fn semiannual_coupons(&self) -> bool {
        self.semiannual_coupons
    }

    /// Returns the first year the bond type traded on Tesouro Direto.
    #[must_use]
    pub const fn first_year(&self) -> i32 {
        self.first_year
    }
}

/// Registry of all supported bond types.
#[derive(Debug)]
pub struct BondRegistry {
    bonds: HashMap<BondType, BondInfo>,
}

impl BondRegistry {
    /// Returns the global bond registry.
    ///
    /// The registry is initialized lazily on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::load)
    }

    /// Loads bond metadata from the embedded JSON data.
    fn load() -> Self {
        let by_code: HashMap<String, BondInfo> =
            serde_json::from_str(BONDS_JSON).expect("Invalid bonds.json");
        let bonds = by_code
            .into_values()
            .map(|info| (info.bond_type, info))
            .collect();
        Self { bonds }
    }

    /// Looks up a bond by code (case-insensitive, any separator spelling).
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&BondInfo> {
        code.parse::<BondType>()
            .ok()
            .and_then(|bond_type| self.info(bond_type))
    }

    /// Returns the metadata for a bond type.
    #[must_use]
    pub fn info(&self, bond_type: BondType) -> Option<&BondInfo> {
        self.bonds.get(&bond_type)
    }

    /// Returns all bonds in [`BondType::all`] order.
    pub fn all(&self) -> impl Iterator<Item = &BondInfo> {
        BondType::all().iter().filter_map(|b| self.bonds.get(b))
    }

    /// Returns the total number of bond types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Returns bonds with the given indexer.
    pub fn by_indexer(&self, indexer: Indexer) -> impl Iterator<Item = &BondInfo> {
        self.all().filter(move |i| i.indexer == indexer)
    }

    /// Searches bonds by code or public name (case-insensitive).
    pub fn search(&self, pattern: &str) -> Vec<&BondInfo> {
        let pattern = pattern.to_lowercase();
        self.all()
            .filter(|i| {
                i.bond_type.code().to_lowercase().contains(&pattern)
                    || i.name.to_lowercase().contains(&pattern)
            })
            .collect()
    }
}
