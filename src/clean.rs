//! Offline cleaning and subsampling of a raw `metadata.csv`.
//!
//! The pipeline works on raw CSV rows so every source column survives into
//! the output:
//!
//! 1. Read rows, skipping malformed ones (more fields than the header, or rows
//!    the CSV reader rejects). Short rows are padded with empty cells.
//! 2. Trim whitespace around column names.
//! 3. Drop rows with an empty `title` or `publish_time`. NA markers such as
//!    `NA` or `NaN` count as empty, and are written back as empty cells.
//! 4. Drop rows whose `publish_time` does not parse as a date.
//! 5. Rewrite `publish_time` as `YYYY-MM-DD` and set the `year` column,
//!    appending it when the header has none.
//! 6. Keep a uniform random sample of the rows when the sample fraction is
//!    below one. Sampled rows keep their input order.
//!
//! ```
//! use cordex::clean::{clean_csv, CleanConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let input = "title,publish_time\nA Study,2020-03-01\n,2021-01-01\nB Study,bad-date\n";
//! let mut output = Vec::new();
//!
//! let mut config = CleanConfig::new();
//! config.set_sample_fraction(1.0);
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let counts = clean_csv(input.as_bytes(), &mut output, &config, &mut rng).unwrap();
//! assert_eq!((counts.rows_read, counts.rows_cleaned), (3, 1));
//! assert_eq!(String::from_utf8(output).unwrap(), "title,publish_time,year\nA Study,2020-03-01,2020\n");
//! ```

use chrono::Datelike;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use either::{Either, Left, Right};
use itertools::Itertools;
use rand::Rng;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::utils::{is_na_marker, parse_publish_date};
use crate::{MetadataError, Result};

/// Fraction of rows kept by default.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.05;

/// Seed the command-line tool uses for sampling by default.
pub const DEFAULT_SEED: u64 = 42;

const TITLE_COLUMN: &str = "title";
const PUBLISH_TIME_COLUMN: &str = "publish_time";
const YEAR_COLUMN: &str = "year";

/// Configuration for the cleaning pipeline.
///
/// # Examples
///
/// ```
/// use cordex::CleanConfig;
///
/// let mut config = CleanConfig::new();
/// config.set_sample_fraction(0.25).set_delimiter(b'\t');
/// assert_eq!(config.sample_fraction(), 0.25);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Fraction of cleaned rows to keep, in `(0, 1]`
    sample_fraction: f64,
    /// Delimiter of both input and output
    delimiter: u8,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanConfig {
    /// Creates a configuration sampling [`DEFAULT_SAMPLE_FRACTION`] of a
    /// comma-separated file
    #[must_use]
    pub fn new() -> Self {
        Self {
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            delimiter: b',',
        }
    }

    /// Sets the fraction of cleaned rows to keep
    pub fn set_sample_fraction(&mut self, fraction: f64) -> &mut Self {
        self.sample_fraction = fraction;
        self
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    /// Checks that the sample fraction is in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::InvalidFieldValue` otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.sample_fraction > 0.0 && self.sample_fraction <= 1.0 {
            Ok(())
        } else {
            Err(MetadataError::InvalidFieldValue {
                field: "sample_frac".to_string(),
                message: format!("{} is not in (0, 1]", self.sample_fraction),
            })
        }
    }
}

/// Row counts reported by a cleaning run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    /// Rows read, not counting skipped malformed rows
    pub rows_read: usize,
    /// Rows written
    pub rows_cleaned: usize,
    pub malformed_skipped: usize,
    /// Rows without a title or publish time
    pub missing_required: usize,
    /// Rows whose publish time did not parse
    pub bad_dates: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dropped {
    MissingRequired,
    BadDate,
}

/// Positions of the columns the pipeline reads or rewrites.
#[derive(Debug)]
struct Layout {
    headers: StringRecord,
    title: usize,
    publish_time: usize,
    /// `None` when the year column has to be appended
    year: Option<usize>,
}

impl Layout {
    fn new(raw_headers: &StringRecord) -> Result<Self> {
        let headers: StringRecord = raw_headers.iter().map(str::trim).collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let title = position(TITLE_COLUMN)
            .ok_or_else(|| MetadataError::MissingField(TITLE_COLUMN.to_string()))?;
        let publish_time = position(PUBLISH_TIME_COLUMN)
            .ok_or_else(|| MetadataError::MissingField(PUBLISH_TIME_COLUMN.to_string()))?;
        let year = position(YEAR_COLUMN);

        Ok(Self {
            headers,
            title,
            publish_time,
            year,
        })
    }

    fn output_headers(&self) -> StringRecord {
        let mut headers = self.headers.clone();
        if self.year.is_none() {
            headers.push_field(YEAR_COLUMN);
        }
        headers
    }

    /// Returns the rewritten row, or why it was dropped.
    fn clean_row(&self, row: &StringRecord) -> Either<Dropped, StringRecord> {
        let cell = |index: usize| {
            let value = row.get(index).unwrap_or_default();
            if is_na_marker(value) {
                ""
            } else {
                value
            }
        };

        if cell(self.title).is_empty() || cell(self.publish_time).is_empty() {
            return Left(Dropped::MissingRequired);
        }
        let Some(date) = parse_publish_date(cell(self.publish_time)) else {
            return Left(Dropped::BadDate);
        };

        let publish_time = date.format("%Y-%m-%d").to_string();
        let year = date.year().to_string();
        let mut cleaned: StringRecord = (0..self.headers.len())
            .map(|index| match index {
                i if i == self.publish_time => publish_time.as_str(),
                i if Some(i) == self.year => year.as_str(),
                i => cell(i),
            })
            .collect();
        if self.year.is_none() {
            cleaned.push_field(&year);
        }
        Right(cleaned)
    }
}

/// Reads every well-formed row of the input.
fn read_rows<R: Read>(input: R, delimiter: u8) -> Result<(Layout, Vec<StringRecord>, usize)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let layout = Layout::new(reader.headers()?)?;

    let mut rows = Vec::new();
    let mut malformed = 0;
    for result in reader.records() {
        match result {
            Ok(row) if row.len() <= layout.headers.len() => rows.push(row),
            Ok(row) => {
                malformed += 1;
                warn!(
                    "skipping row at line {}: {} fields, expected {}",
                    row.position().map_or(0, |pos| pos.line()),
                    row.len(),
                    layout.headers.len()
                );
            }
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                malformed += 1;
                warn!("skipping malformed row: {}", err);
            }
        }
    }
    Ok((layout, rows, malformed))
}

/// Keeps `round(fraction * len)` rows chosen uniformly without replacement,
/// in their original order.
fn sample_rows<T, G>(rows: Vec<T>, fraction: f64, rng: &mut G) -> Vec<T>
where
    G: Rng + ?Sized,
{
    if fraction >= 1.0 {
        return rows;
    }
    let amount = ((rows.len() as f64 * fraction).round() as usize).min(rows.len());
    let mut keep = vec![false; rows.len()];
    for index in rand::seq::index::sample(rng, rows.len(), amount) {
        keep[index] = true;
    }
    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, kept)| kept.then_some(row))
        .collect()
}

/// Runs the pipeline from `input` to `output`.
///
/// The whole input is read before anything is written.
///
/// # Errors
///
/// Returns `MetadataError::InvalidFieldValue` for a sample fraction outside
/// `(0, 1]`, `MetadataError::MissingField` when the header lacks `title` or
/// `publish_time`, and `MetadataError::Io` for read or write failures.
pub fn clean_csv<R, W, G>(input: R, output: W, config: &CleanConfig, rng: &mut G) -> Result<RowCounts>
where
    R: Read,
    W: Write,
    G: Rng + ?Sized,
{
    config.validate()?;
    let (layout, rows) = prepare(input, config, rng)?;
    write_rows(output, config, &layout, &rows.cleaned)?;
    Ok(rows.counts)
}

struct Prepared {
    cleaned: Vec<StringRecord>,
    counts: RowCounts,
}

fn prepare<R, G>(input: R, config: &CleanConfig, rng: &mut G) -> Result<(Layout, Prepared)>
where
    R: Read,
    G: Rng + ?Sized,
{
    let (layout, rows, malformed_skipped) = read_rows(input, config.delimiter)?;
    let rows_read = rows.len();
    info!("read {} rows ({} malformed rows skipped)", rows_read, malformed_skipped);

    let (dropped, kept): (Vec<Dropped>, Vec<StringRecord>) =
        rows.iter().partition_map(|row| layout.clean_row(row));
    let missing_required = dropped
        .iter()
        .filter(|reason| **reason == Dropped::MissingRequired)
        .count();
    let bad_dates = dropped.len() - missing_required;
    debug!(
        "dropped {} rows without title or publish_time and {} with unparseable dates",
        missing_required, bad_dates
    );

    let cleaned = sample_rows(kept, config.sample_fraction(), rng);
    debug!(
        "kept {} rows after sampling (fraction={})",
        cleaned.len(),
        config.sample_fraction()
    );

    let counts = RowCounts {
        rows_read,
        rows_cleaned: cleaned.len(),
        malformed_skipped,
        missing_required,
        bad_dates,
    };
    Ok((layout, Prepared { cleaned, counts }))
}

fn write_rows<W: Write>(
    output: W,
    config: &CleanConfig,
    layout: &Layout,
    rows: &[StringRecord],
) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(config.delimiter)
        .from_writer(output);
    writer.write_record(&layout.output_headers())?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Cleans the CSV file at `input_path` and writes the result to
/// `output_path`. The output file is only created once the input has been
/// read and cleaned.
///
/// # Errors
///
/// See [`clean_csv`].
pub fn clean<G>(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &CleanConfig,
    rng: &mut G,
) -> Result<RowCounts>
where
    G: Rng + ?Sized,
{
    config.validate()?;
    let input = File::open(input_path.as_ref())?;
    let (layout, rows) = prepare(input, config, rng)?;

    let output_path = output_path.as_ref();
    let output = File::create(output_path)?;
    write_rows(output, config, &layout, &rows.cleaned)?;
    info!(
        "wrote {} rows to {}",
        rows.counts.rows_cleaned,
        output_path.display()
    );
    Ok(rows.counts)
}
