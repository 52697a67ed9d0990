//! Year-range and journal filtering.
//!
//! Filtering never touches the source [`Dataset`]; it returns a new view that
//! shares the selected records.
//!
//! ```
//! use cordex::{Dataset, FilterCriteria, JournalFilter, Record};
//! use chrono::NaiveDate;
//!
//! let dataset = Dataset::from_records(vec![
//!     Record::new("a").with_publish_time(NaiveDate::from_ymd_opt(2020, 1, 1)),
//!     Record::new("b").with_publish_time(NaiveDate::from_ymd_opt(2023, 1, 1)),
//!     Record::new("c"),
//! ]);
//!
//! let criteria = FilterCriteria::new(2020..=2021, JournalFilter::from("Unknown"));
//! let filtered = dataset.filter(&criteria);
//! assert_eq!(filtered.len(), 1);
//! assert_eq!(dataset.len(), 3);
//! ```

use std::ops::RangeInclusive;

use crate::{Dataset, Record};

/// Journal selector value meaning "no journal filter".
pub const ALL_JOURNALS: &str = "All";

/// Journal part of a [`FilterCriteria`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum JournalFilter {
    /// Every journal, including records without one
    #[default]
    All,
    /// Exact, case-sensitive match on the journal name, where a missing
    /// journal counts as [`crate::UNKNOWN_JOURNAL`]
    Named(String),
}

impl JournalFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            JournalFilter::All => true,
            JournalFilter::Named(name) => record.journal_or_unknown() == name,
        }
    }
}

impl From<&str> for JournalFilter {
    fn from(value: &str) -> Self {
        if value == ALL_JOURNALS {
            JournalFilter::All
        } else {
            JournalFilter::Named(value.to_string())
        }
    }
}

impl From<String> for JournalFilter {
    fn from(value: String) -> Self {
        if value == ALL_JOURNALS {
            JournalFilter::All
        } else {
            JournalFilter::Named(value)
        }
    }
}

/// Criteria selected by the user for one view of the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Inclusive year bounds
    pub years: RangeInclusive<i32>,
    pub journal: JournalFilter,
}

impl FilterCriteria {
    #[must_use]
    pub fn new(years: RangeInclusive<i32>, journal: JournalFilter) -> Self {
        Self { years, journal }
    }

    /// Whether `record` has a year inside the range and a matching journal.
    /// Records without a year never match.
    pub fn matches(&self, record: &Record) -> bool {
        record.year().is_some_and(|year| self.years.contains(&year))
            && self.journal.matches(record)
    }
}

impl Dataset {
    /// Returns a view of the records matching `criteria`.
    #[must_use]
    pub fn filter(&self, criteria: &FilterCriteria) -> Dataset {
        self.select(|record| criteria.matches(record))
    }
}

/// Returns a view of the records of `dataset` matching `criteria`.
#[must_use]
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    dataset.filter(criteria)
}
