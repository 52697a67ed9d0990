//! Writing a [`Dataset`] back out as CSV.
//!
//! Standard columns come first, in [`STANDARD_COLUMNS`] order, followed by
//! the dataset's extra columns in the order they appeared in the source file.
//! Null fields are written as empty cells and dates as `YYYY-MM-DD`.

use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::csv::Column;
use crate::{Dataset, Record, Result};

/// File name offered for a filtered-data download.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "cord19_filtered.csv";

/// Column order of exported files.
pub const STANDARD_COLUMNS: [Column; 8] = [
    Column::Id,
    Column::Title,
    Column::Abstract,
    Column::PublishTime,
    Column::Year,
    Column::Journal,
    Column::Authors,
    Column::Source,
];

fn standard_value(record: &Record, column: Column) -> String {
    let text = |value: Option<&str>| value.unwrap_or_default().to_string();
    match column {
        Column::Id => record.id().to_string(),
        Column::Title => text(record.title()),
        Column::Abstract => text(record.abstract_text()),
        Column::PublishTime => record
            .publish_time()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Column::Year => record.year().map(|y| y.to_string()).unwrap_or_default(),
        Column::Journal => text(record.journal()),
        Column::Authors => text(record.authors()),
        Column::Source => text(record.source()),
    }
}

/// Writes `dataset` as CSV to `writer`.
///
/// # Errors
///
/// Returns `MetadataError::Io` if the writer fails.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    let header = STANDARD_COLUMNS
        .iter()
        .map(|column| column.name())
        .chain(dataset.extra_columns().iter().map(String::as_str));
    csv_writer.write_record(header)?;

    for record in dataset {
        let standard = STANDARD_COLUMNS
            .iter()
            .map(|column| standard_value(record, *column));
        let extra = dataset.extra_columns().iter().map(|column| {
            record
                .extra_fields()
                .get(column)
                .cloned()
                .unwrap_or_default()
        });
        csv_writer.write_record(standard.chain(extra))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes `dataset` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// Returns `MetadataError::Io` if the file cannot be created or written.
pub fn write_dataset_to_path(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_dataset(dataset, file)
}

impl Dataset {
    /// Serializes the dataset as CSV bytes, ready to be offered as a download.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if serialization fails.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        write_dataset(self, &mut bytes)?;
        Ok(bytes)
    }
}
