//! Ordered result table.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::{BondRecord, BondType};

/// Records returned by a query, sorted by reference date.
///
/// Records sharing a reference date are ordered by asset code, so the same
/// input always yields the same table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    records: Vec<BondRecord>,
}

impl ResultTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a table from records in any order.
    #[must_use]
    pub fn from_unsorted(mut records: Vec<BondRecord>) -> Self {
        records.sort_by(|a, b| {
            a.reference_date
                .cmp(&b.reference_date)
                .then_with(|| a.asset_code.cmp(&b.asset_code))
        });
        Self { records }
    }

    /// Merges two tables, keeping the ordering.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let mut records = self.records;
        records.extend(other.records);
        Self::from_unsorted(records)
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[BondRecord] {
        &self.records
    }

    /// Consumes the table, returning its records.
    #[must_use]
    pub fn into_records(self) -> Vec<BondRecord> {
        self.records
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, BondRecord> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the earliest reference date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.reference_date)
    }

    /// Returns the latest reference date.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.reference_date)
    }

    /// Returns the distinct asset codes, sorted.
    #[must_use]
    pub fn asset_codes(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.asset_code.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the records of a single bond type.
    pub fn filter_bond(&self, bond_type: BondType) -> impl Iterator<Item = &BondRecord> {
        self.records.iter().filter(move |r| r.bond_type == bond_type)
    }
}

impl IntoIterator for ResultTable {
    type Item = BondRecord;
    type IntoIter = std::vec::IntoIter<BondRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a BondRecord;
    type IntoIter = std::slice::Iter<'a, BondRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
