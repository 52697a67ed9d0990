//! Count tables for charting.
//!
//! - [`by_year`]: papers per derived year, ascending. Years without papers are
//!   omitted, as are papers without a year.
//! - [`top_journals`]: papers per journal (missing journals count as
//!   [`crate::UNKNOWN_JOURNAL`]), by descending count with ties ordered by name.
//! - [`journal_choices`] and [`year_bounds`]: values for the journal selector
//!   and the year range selector.

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use crate::filter::ALL_JOURNALS;
use crate::Record;

/// Year range offered when no record has a year.
pub const DEFAULT_YEAR_BOUNDS: RangeInclusive<i32> = 2019..=2022;

/// Journals listed in the journal selector.
pub const DEFAULT_JOURNAL_CHOICES: usize = 100;

/// Ordered `(key, count)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountTable<K>(Vec<(K, usize)>);

impl<K> Default for CountTable<K> {
    fn default() -> Self {
        CountTable(Vec::new())
    }
}

impl<K: PartialEq> CountTable<K> {
    /// Count for `key`, if it is in the table.
    pub fn get(&self, key: &K) -> Option<usize> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, count)| *count)
    }
}

impl<K> CountTable<K> {
    pub fn as_slice(&self) -> &[(K, usize)] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (K, usize)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }

    pub fn into_vec(self) -> Vec<(K, usize)> {
        self.0
    }
}

impl<'a, K> IntoIterator for &'a CountTable<K> {
    type Item = &'a (K, usize);
    type IntoIter = std::slice::Iter<'a, (K, usize)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Number of records per derived year, in ascending year order.
pub fn by_year<'a, I>(records: I) -> CountTable<i32>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = BTreeMap::new();
    for year in records.into_iter().filter_map(Record::year) {
        *counts.entry(year).or_insert(0) += 1;
    }
    CountTable(counts.into_iter().collect())
}

/// The `top_n` journals with the most records.
pub fn top_journals<'a, I>(records: I, top_n: usize) -> CountTable<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let counts: HashMap<&str, usize> = records
        .into_iter()
        .map(Record::journal_or_unknown)
        .counts();

    let ranked = counts
        .into_iter()
        .k_smallest_by(top_n, |(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        })
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    CountTable(ranked)
}

/// Options for a journal selector: [`ALL_JOURNALS`] followed by the `limit`
/// most frequent journal names.
pub fn journal_choices<'a, I>(records: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    std::iter::once(ALL_JOURNALS.to_string())
        .chain(top_journals(records, limit).into_vec().into_iter().map(|(name, _)| name))
        .collect()
}

/// Smallest and largest derived year, or [`DEFAULT_YEAR_BOUNDS`] when no
/// record has a year.
pub fn year_bounds<'a, I>(records: I) -> RangeInclusive<i32>
where
    I: IntoIterator<Item = &'a Record>,
{
    match records.into_iter().filter_map(Record::year).minmax() {
        MinMaxResult::NoElements => DEFAULT_YEAR_BOUNDS,
        MinMaxResult::OneElement(year) => year..=year,
        MinMaxResult::MinMax(min, max) => min..=max,
    }
}
