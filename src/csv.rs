//! CSV metadata loader.
//!
//! Reads `metadata.csv`-style files into a [`Dataset`]. Column names are
//! matched case-insensitively against a configurable alias table, required
//! columns that are missing from the file come back as nulls, and the
//! publication year is always derived from `publish_time`.
//!
//! # Example
//!
//! ```
//! use cordex::{CsvLoader, RecordParser};
//!
//! let input = "cord_uid,title,publish_time,year\nx1,Example Paper,2021-05-04,1999";
//!
//! let dataset = CsvLoader::new().parse(input).unwrap();
//! let record = &dataset.records()[0];
//! assert_eq!(record.title(), Some("Example Paper"));
//! assert_eq!(record.year(), Some(2021));
//! assert_eq!(record.journal(), None);
//! ```

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Dataset, MetadataError, RecordParser, Result};

pub mod export;
mod structure;

pub use export::{DEFAULT_EXPORT_FILE_NAME, write_dataset, write_dataset_to_path};
use structure::{HeaderLayout, RawCsvRow};

/// A column the loader maps onto a [`crate::Record`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Id,
    Title,
    Abstract,
    PublishTime,
    Year,
    Journal,
    Authors,
    Source,
}

impl Column {
    /// Canonical header name used when writing CSV.
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "cord_uid",
            Column::Title => "title",
            Column::Abstract => "abstract",
            Column::PublishTime => "publish_time",
            Column::Year => "year",
            Column::Journal => "journal",
            Column::Authors => "authors",
            Column::Source => "source",
        }
    }
}

/// Default header aliases for each column
const DEFAULT_HEADERS: &[(Column, &[&str])] = &[
    (Column::Id, &["cord_uid", "id", "uid"]),
    (Column::Title, &["title"]),
    (Column::Abstract, &["abstract", "summary"]),
    (
        Column::PublishTime,
        &["publish_time", "publish_date", "date"],
    ),
    (Column::Year, &["year"]),
    (
        Column::Journal,
        &["journal", "journal title", "source title"],
    ),
    (Column::Authors, &["authors", "author"]),
    (Column::Source, &["source", "source_x"]),
];

/// Configuration for CSV loading.
///
/// # Default Mappings
///
/// - "id" → ["cord_uid", "id", "uid"]
/// - "publish_time" → ["publish_time", "publish_date", "date"]
/// - "source" → ["source", "source_x"]
///   etc.
///
/// When a file has several headers for one column, the value under the alias
/// listed first is used; the others only fill in when it is empty. With the
/// defaults a `publish_time` cell wins over a `date` cell regardless of which
/// header comes first in the file.
///
/// # Examples
///
/// ```
/// use cordex::csv::{Column, CsvConfig};
///
/// let mut config = CsvConfig::new();
/// config
///     .set_header_mapping(Column::PublishTime, vec!["Published".to_string()])
///     .set_delimiter(b';')
///     .set_skip_malformed(true);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Header aliases per column, compared lower-cased and trimmed
    header_map: HashMap<Column, Vec<String>>,
    /// Delimiter to use for parsing the CSV
    delimiter: u8,
    /// Skip rows the reader cannot parse instead of failing
    skip_malformed: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a new CSV configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        let mut config = Self {
            header_map: HashMap::new(),
            delimiter: b',',
            skip_malformed: false,
        };
        for (column, aliases) in DEFAULT_HEADERS {
            config.set_header_mapping(*column, aliases.iter().map(|s| s.to_string()).collect());
        }
        config
    }

    /// Replaces the header aliases of a column
    pub fn set_header_mapping(&mut self, column: Column, aliases: Vec<String>) -> &mut Self {
        let aliases = aliases
            .into_iter()
            .map(|alias| alias.trim().to_lowercase())
            .collect();
        self.header_map.insert(column, aliases);
        self
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether malformed rows are skipped rather than reported
    pub fn set_skip_malformed(&mut self, skip: bool) -> &mut Self {
        self.skip_malformed = skip;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Finds the column for a given header
    pub fn column_for_header(&self, header: &str) -> Option<Column> {
        self.resolve_header(header).map(|(column, _)| column)
    }

    /// The column for `header` and the position of the matching alias in
    /// that column's alias list. A lower position takes precedence when
    /// several headers of one file map onto the same column.
    pub(crate) fn resolve_header(&self, header: &str) -> Option<(Column, usize)> {
        let header = header.trim().to_lowercase();
        self.header_map
            .iter()
            .filter_map(|(column, aliases)| {
                aliases
                    .iter()
                    .position(|alias| *alias == header)
                    .map(|rank| (*column, rank))
            })
            .min()
    }
}

/// Loader for CSV metadata files.
///
/// # Examples
///
/// ```no_run
/// use cordex::csv::{CsvConfig, CsvLoader};
///
/// let mut config = CsvConfig::new();
/// config.set_skip_malformed(true);
///
/// let dataset = CsvLoader::new().with_config(config).load("data/cleaned_sample.csv")?;
/// println!("{} papers", dataset.len());
/// # Ok::<(), cordex::MetadataError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    config: CsvConfig,
}

impl CsvLoader {
    /// Creates a new loader with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
        }
    }

    /// Creates a new loader with custom configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::Io` when the file is missing or unreadable, and
    /// `MetadataError::MalformedInput` for an unparsable row unless malformed
    /// rows are configured to be skipped.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = self.read(file, Some(path.to_path_buf()))?;
        debug!(
            "loaded {} records from {} (extra_columns={})",
            dataset.len(),
            path.display(),
            dataset.extra_columns().len()
        );
        Ok(dataset)
    }

    fn read<R: Read>(&self, input: R, path: Option<PathBuf>) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter())
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let layout = HeaderLayout::new(reader.headers()?, &self.config);

        let mut records = Vec::new();
        let mut row = StringRecord::new();
        loop {
            let parsed = match reader.read_record(&mut row) {
                Ok(false) => break,
                Ok(true) => RawCsvRow::from_record(&layout, &row),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => Err(MetadataError::MalformedInput {
                    line: err.position().map_or(0, |pos| pos.line()),
                    message: err.to_string(),
                }),
            };
            match parsed {
                Ok(raw) => records.push(raw.into_record()),
                Err(err) if self.config.skip_malformed => {
                    warn!("skipping malformed row: {}", err);
                }
                Err(err) => return Err(err),
            }
        }

        let dataset = Dataset::from_records(records).with_extra_columns(layout.extra_columns());
        Ok(match path {
            Some(path) => dataset.with_path(path),
            None => dataset,
        })
    }
}

impl RecordParser for CsvLoader {
    fn parse(&self, input: &str) -> Result<Dataset> {
        self.read(input.as_bytes(), None)
    }
}

/// Loads a metadata CSV with the default configuration.
///
/// # Errors
///
/// See [`CsvLoader::load`].
pub fn load(path: impl AsRef<Path>) -> Result<Dataset> {
    CsvLoader::new().load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[test]
    fn test_basic_csv() {
        let input = "\
cord_uid,title,abstract,publish_time,journal,authors,source
id000,Impact of COVID-19 on Health,An abstract.,2020-03-01,Journal of Health,Smith J; Doe A,PMC
id001,\"Masks, Distancing and You\",,2021-07-15,,Lee K,medRxiv";

        let dataset = CsvLoader::new().parse(input).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.records()[0];
        assert_eq!(first.id(), "id000");
        assert_eq!(first.title(), Some("Impact of COVID-19 on Health"));
        assert_eq!(first.abstract_text(), Some("An abstract."));
        assert_eq!(first.publish_time(), NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(first.year(), Some(2020));
        assert_eq!(first.journal(), Some("Journal of Health"));
        assert_eq!(first.authors(), Some("Smith J; Doe A"));
        assert_eq!(first.source(), Some("PMC"));

        let second = &dataset.records()[1];
        assert_eq!(second.title(), Some("Masks, Distancing and You"));
        assert_eq!(second.abstract_text(), None);
        assert_eq!(second.journal(), None);
        assert_eq!(second.journal_or_unknown(), "Unknown");
    }

    #[test]
    fn test_missing_columns_are_null() {
        let input = "cord_uid,title\nid000,Only a title";

        let dataset = CsvLoader::new().parse(input).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.title(), Some("Only a title"));
        assert_eq!(record.abstract_text(), None);
        assert_eq!(record.publish_time(), None);
        assert_eq!(record.year(), None);
        assert_eq!(record.journal(), None);
        assert_eq!(record.source(), None);
    }

    #[test]
    fn test_year_is_recomputed_from_publish_time() {
        let input = "\
title,publish_time,year
Kept year,2021-01-01,1999
Bad date,not a date,2020
No date,,2020";

        let dataset = CsvLoader::new().parse(input).unwrap();
        let years: Vec<Option<i32>> = dataset.iter().map(|r| r.year()).collect();
        assert_eq!(years, vec![Some(2021), None, None]);
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_header_aliases_and_extra_columns() {
        let input = "\
 CORD_UID ,Title,source_x,Publish_Date,doi,license
u1,Aliased,PMC,2020,10.1000/x,cc-by";

        let dataset = CsvLoader::new().parse(input).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.id(), "u1");
        assert_eq!(record.title(), Some("Aliased"));
        assert_eq!(record.source(), Some("PMC"));
        assert_eq!(record.year(), Some(2020));
        assert_eq!(dataset.extra_columns(), &["doi".to_string(), "license".to_string()]);
        assert_eq!(record.extra_fields().get("doi"), Some(&"10.1000/x".to_string()));
    }

    #[test]
    fn test_generated_id_when_missing() {
        let input = "title\nFirst\nSecond";

        let dataset = CsvLoader::new().parse(input).unwrap();
        let first = dataset.records()[0].id();
        let second = dataset.records()[1].id();
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[test]
    fn test_custom_headers_and_delimiter() {
        let input = "Name;Published;Venue\nCustom;2022-02-02;Virology Today";

        let mut config = CsvConfig::new();
        config
            .set_header_mapping(Column::Title, vec!["Name".to_string()])
            .set_header_mapping(Column::PublishTime, vec!["Published".to_string()])
            .set_header_mapping(Column::Journal, vec!["Venue".to_string()])
            .set_delimiter(b';');

        assert_eq!(config.delimiter(), b';');

        let dataset = CsvLoader::new().with_config(config).parse(input).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.title(), Some("Custom"));
        assert_eq!(record.year(), Some(2022));
        assert_eq!(record.journal(), Some("Virology Today"));
    }

    #[rstest]
    #[case("cord_uid", Some(Column::Id))]
    #[case(" Publish_Time ", Some(Column::PublishTime))]
    #[case("date", Some(Column::PublishTime))]
    #[case("source_x", Some(Column::Source))]
    #[case("Journal Title", Some(Column::Journal))]
    #[case("license", None)]
    fn test_column_for_header(#[case] header: &str, #[case] expected: Option<Column>) {
        assert_eq!(CsvConfig::new().column_for_header(header), expected);
    }

    #[test]
    fn test_na_cells_and_preferred_date_column() {
        let input = "date,title,publish_time,journal\n\
                     2019-05-05,With journal,2020-01-01,Vaccine\n\
                     2019-05-05,No journal,NaN,NA";

        let dataset = CsvLoader::new().parse(input).unwrap();
        let years: Vec<_> = dataset.iter().map(|record| record.year()).collect();
        assert_eq!(years, vec![Some(2020), Some(2019)]);
        assert_eq!(dataset.records()[1].journal(), None);
        assert_eq!(dataset.records()[1].journal_or_unknown(), "Unknown");
    }

    #[rstest]
    #[case(false, None)]
    #[case(true, Some(2))]
    fn test_row_with_too_many_fields(#[case] skip: bool, #[case] expected_len: Option<usize>) {
        let input = "title,publish_time\nGood,2020-01-01\nBad,2020-01-01,extra\nAlso good,2021-01-01";

        let mut config = CsvConfig::new();
        config.set_skip_malformed(skip);

        let result = CsvLoader::new().with_config(config).parse(input);
        match expected_len {
            Some(len) => assert_eq!(result.unwrap().len(), len),
            None => assert!(matches!(
                result,
                Err(MetadataError::MalformedInput { line: 3, .. })
            )),
        }
    }

    #[test]
    fn test_short_rows_are_padded() {
        let input = "title,publish_time,journal\nShort row,2020-05-05";

        let dataset = CsvLoader::new().parse(input).unwrap();
        assert_eq!(dataset.records()[0].journal(), None);
        assert_eq!(dataset.records()[0].year(), Some(2020));
    }

    #[test]
    fn test_empty_input() {
        let dataset = CsvLoader::new().parse("").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("definitely/not/here.csv");
        assert!(matches!(result, Err(MetadataError::Io(_))));
    }

    #[test]
    fn test_load_sets_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,publish_time\nOn disk,2020-08-08").unwrap();

        let dataset = load(file.path()).unwrap();
        assert_eq!(dataset.path(), Some(file.path()));
        assert_eq!(dataset.len(), 1);
    }
}
