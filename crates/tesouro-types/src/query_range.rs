//! Query range and year iteration.

use chrono::{Datelike, NaiveDate, Utc};

use crate::{BondType, FIRST_YEAR, TesouroError};

/// A bond type and an inclusive range of calendar years to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    /// Bond type to retrieve.
    pub bond_type: BondType,
    /// First year (inclusive).
    pub start_year: i32,
    /// Last year (inclusive).
    pub end_year: i32,
}

impl QueryRange {
    /// Creates a new query range, validating the years against the current date.
    ///
    /// # Errors
    ///
    /// Returns [`TesouroError::InvalidArgument`] if `start_year > end_year`,
    /// if `start_year` predates Tesouro Direto or if `end_year` is in the future.
    pub fn new(bond_type: BondType, start_year: i32, end_year: i32) -> Result<Self, TesouroError> {
        Self::with_last_year(bond_type, start_year, end_year, Utc::now().year())
    }

    /// Creates a new query range with an explicit latest valid year.
    ///
    /// # Errors
    ///
    /// Same as [`QueryRange::new`], with `last_valid_year` standing in for the
    /// current year.
    pub fn with_last_year(
        bond_type: BondType,
        start_year: i32,
        end_year: i32,
        last_valid_year: i32,
    ) -> Result<Self, TesouroError> {
        if start_year > end_year {
            return Err(TesouroError::InvalidArgument(format!(
                "start year {start_year} is after end year {end_year}"
            )));
        }
        if start_year < FIRST_YEAR {
            return Err(TesouroError::InvalidArgument(format!(
                "start year {start_year} predates Tesouro Direto ({FIRST_YEAR})"
            )));
        }
        if end_year > last_valid_year {
            return Err(TesouroError::InvalidArgument(format!(
                "end year {end_year} is in the future (latest is {last_valid_year})"
            )));
        }
        Ok(Self {
            bond_type,
            start_year,
            end_year,
        })
    }

    /// Creates a range covering a single year.
    ///
    /// # Errors
    ///
    /// Same as [`QueryRange::new`].
    pub fn single_year(bond_type: BondType, year: i32) -> Result<Self, TesouroError> {
        Self::new(bond_type, year, year)
    }

    /// Returns an iterator over all years in the range.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// Returns the number of years in the range.
    #[must_use]
    pub fn total_years(&self) -> usize {
        (self.end_year - self.start_year + 1) as usize
    }

    /// Returns January 1st of the first year.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Returns December 31st of the last year.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    /// Returns true if the range contains the given date.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_year..=self.end_year).contains(&date.year())
    }

    /// Returns the same years for another bond type.
    #[must_use]
    pub const fn for_bond(&self, bond_type: BondType) -> Self {
        Self {
            bond_type,
            start_year: self.start_year,
            end_year: self.end_year,
        }
    }
}

impl std::fmt::Display for QueryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_year == self.end_year {
            write!(f, "{} {}", self.bond_type, self.start_year)
        } else {
            write!(f, "{} {}-{}", self.bond_type, self.start_year, self.end_year)
        }
    }
}
