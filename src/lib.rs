//! Load, filter, clean and summarize CORD-19 style bibliographic metadata.
//!
//! `cordex` is the data core of a small exploratory dashboard over a sample of
//! paper metadata (`metadata.csv`). It reads the CSV into typed [`Record`]s,
//! narrows them by year range and journal, and produces the aggregates a
//! dashboard charts: publications per year, top journals, and title word
//! frequencies. A separate offline pipeline cleans and subsamples a raw file.
//!
//! # Key Features
//!
//! - **Record Loader**: header aliases (`cord_uid`, `source_x`, ...), missing
//!   columns become nulls, the publication year is derived from `publish_time`
//! - **Filter Engine**: inclusive year range plus exact journal match
//! - **Word Frequencies**: `\w+` tokenization with length, numeric and
//!   stopword exclusion, deterministic tie-breaks
//! - **Aggregates**: counts per year, top journals, selector choices
//! - **Cleaning Pipeline**: skips malformed rows, drops rows without title or
//!   date, seeded subsampling
//!
//! # Basic Usage
//!
//! ```rust
//! use cordex::{CsvLoader, FilterCriteria, JournalFilter, RecordParser};
//! use cordex::aggregate::{by_year, top_journals};
//! use cordex::words::{top_words, StopWords, TextField};
//!
//! let input = "cord_uid,title,publish_time,journal
//! a1,COVID-19 Impact,2020-03-01,Virology Today
//! a2,COVID-19 Vaccine,2021-06-15,Vaccine Research";
//!
//! let dataset = CsvLoader::new().parse(input).unwrap();
//! let criteria = FilterCriteria::new(2020..=2021, JournalFilter::All);
//! let filtered = dataset.filter(&criteria);
//!
//! let per_year = by_year(&filtered);
//! assert_eq!(per_year.get(&2020), Some(1));
//!
//! let journals = top_journals(&filtered, 10);
//! assert_eq!(journals.len(), 2);
//!
//! let words = top_words(&filtered, TextField::Title, 5, &StopWords::new());
//! assert_eq!(words.as_slice()[0].word, "covid");
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`MetadataError`]:
//!
//! ```rust
//! use cordex::{load, MetadataError};
//!
//! match load("does/not/exist.csv") {
//!     Ok(dataset) => println!("Loaded {} papers", dataset.len()),
//!     Err(MetadataError::Io(err)) => eprintln!("Cannot read file: {}", err),
//!     Err(err) => eprintln!("Other error: {}", err),
//! }
//! ```

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

extern crate csv as csv_crate;

pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod csv;
pub mod filter;
mod regex;
mod utils;
pub mod words;

// Reexports
pub use cache::DatasetCache;
pub use clean::{CleanConfig, RowCounts, clean};
pub use csv::{CsvConfig, CsvLoader, load};
pub use filter::{FilterCriteria, JournalFilter, filter};

/// Journal name used for records without a journal.
pub const UNKNOWN_JOURNAL: &str = "Unknown";

/// A specialized Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors that can occur while loading, cleaning or exporting metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value: {field} - {message}")]
    InvalidFieldValue { field: String, message: String },

    #[error("Malformed input: {message} at line {line}")]
    MalformedInput { message: String, line: u64 },
}

impl From<csv_crate::Error> for MetadataError {
    fn from(err: csv_crate::Error) -> Self {
        if !err.is_io_error() {
            return MetadataError::InvalidFormat(err.to_string());
        }
        match err.into_kind() {
            csv_crate::ErrorKind::Io(io) => MetadataError::Io(io),
            other => MetadataError::InvalidFormat(format!("{other:?}")),
        }
    }
}

/// A single bibliographic entry.
///
/// Fields are read-only once a record is built. The derived [`Record::year`]
/// is always the calendar year of [`Record::publish_time`], and is `None`
/// exactly when the publication date is missing or could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    id: String,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    publish_time: Option<NaiveDate>,
    year: Option<i32>,
    journal: Option<String>,
    authors: Option<String>,
    source: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra_fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    /// Sets the publication date, deriving the year from it.
    #[must_use]
    pub fn with_publish_time(mut self, publish_time: Option<NaiveDate>) -> Self {
        self.publish_time = publish_time;
        self.year = publish_time.map(|date| date.year());
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: impl Into<String>) -> Self {
        self.journal = Some(journal.into());
        self
    }

    #[must_use]
    pub fn with_authors(mut self, authors: impl Into<String>) -> Self {
        self.authors = Some(authors.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Keeps the value of a column that has no dedicated field.
    #[must_use]
    pub fn with_extra_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.insert(column.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn publish_time(&self) -> Option<NaiveDate> {
        self.publish_time
    }

    /// Calendar year of the publication date.
    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn journal(&self) -> Option<&str> {
        self.journal.as_deref()
    }

    /// Journal name for display and grouping, [`UNKNOWN_JOURNAL`] when absent.
    pub fn journal_or_unknown(&self) -> &str {
        self.journal.as_deref().unwrap_or(UNKNOWN_JOURNAL)
    }

    pub fn authors(&self) -> Option<&str> {
        self.authors.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn extra_fields(&self) -> &BTreeMap<String, String> {
        &self.extra_fields
    }
}

/// An ordered, immutable collection of [`Record`]s.
///
/// Records are shared behind [`Arc`], so views produced by
/// [`Dataset::filter`] or [`Dataset::head`] point at the same records as the
/// base dataset without copying them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    path: Option<PathBuf>,
    records: Vec<Arc<Record>>,
    extra_columns: Vec<String>,
}

impl Dataset {
    /// Builds an in-memory dataset with no source path.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        records.into_iter().collect()
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the names of source columns that have no dedicated [`Record`] field.
    #[must_use]
    pub fn with_extra_columns(mut self, columns: Vec<String>) -> Self {
        self.extra_columns = columns;
        self
    }

    /// The file the dataset was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().map(Arc::as_ref)
    }

    /// A view of the first `n` records.
    #[must_use]
    pub fn head(&self, n: usize) -> Dataset {
        self.view(self.records.iter().take(n).cloned())
    }

    /// A view of the records matching `predicate`, sharing this dataset's path
    /// and columns.
    pub(crate) fn select<F>(&self, mut predicate: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        self.view(
            self.records
                .iter()
                .filter(|record| predicate(record))
                .cloned(),
        )
    }

    fn view(&self, records: impl Iterator<Item = Arc<Record>>) -> Dataset {
        Dataset {
            path: self.path.clone(),
            records: records.collect(),
            extra_columns: self.extra_columns.clone(),
        }
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset {
            path: None,
            records: iter.into_iter().map(Arc::new).collect(),
            extra_columns: Vec::new(),
        }
    }
}

fn as_record(record: &Arc<Record>) -> &Record {
    record
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter =
        std::iter::Map<std::slice::Iter<'a, Arc<Record>>, fn(&'a Arc<Record>) -> &'a Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records
            .iter()
            .map(as_record as fn(&'a Arc<Record>) -> &'a Record)
    }
}

/// Trait for readers that turn raw text into a [`Dataset`].
pub trait RecordParser {
    /// Parse a string containing a header row and zero or more records.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if the input cannot be read as records
    fn parse(&self, input: &str) -> Result<Dataset>;
}
