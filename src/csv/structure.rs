//! CSV row data structures.
//!
//! This module defines intermediate data structures used during CSV loading.

use crate::csv::{Column, CsvConfig};
use crate::utils::{non_empty, parse_publish_date};
use crate::{MetadataError, Record};
use csv::StringRecord;
use nanoid::nanoid;
use std::collections::{BTreeMap, HashMap};

/// How each header position maps onto record fields, resolved once per file.
#[derive(Debug, Clone)]
pub(crate) struct HeaderLayout {
    /// Trimmed header names in file order
    names: Vec<String>,
    /// Mapped column and alias rank for each header, `None` for extra columns
    columns: Vec<Option<(Column, usize)>>,
}

impl HeaderLayout {
    pub(crate) fn new(headers: &StringRecord, config: &CsvConfig) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let columns = names
            .iter()
            .map(|name| config.resolve_header(name))
            .collect();
        Self { names, columns }
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    /// Names of headers not mapped to a record field, in file order.
    pub(crate) fn extra_columns(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, column)| column.is_none())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Raw field data of one CSV row.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawCsvRow {
    /// Non-empty values of mapped columns
    pub(crate) fields: HashMap<Column, String>,
    /// Non-empty values of unmapped columns
    pub(crate) extra: BTreeMap<String, String>,
}

impl RawCsvRow {
    /// Collects the non-empty cells of a row. Missing trailing cells are
    /// treated as empty.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::MalformedInput` when the row has more fields
    /// than the header.
    pub(crate) fn from_record(
        layout: &HeaderLayout,
        record: &StringRecord,
    ) -> Result<Self, MetadataError> {
        if record.len() > layout.len() {
            return Err(MetadataError::MalformedInput {
                message: format!(
                    "Record has more fields ({}) than headers ({})",
                    record.len(),
                    layout.len()
                ),
                line: record.position().map_or(0, |pos| pos.line()),
            });
        }

        let mut ranked: HashMap<Column, (usize, String)> = HashMap::new();
        let mut extra = BTreeMap::new();
        for ((value, name), column) in record.iter().zip(&layout.names).zip(&layout.columns) {
            let Some(value) = non_empty(value) else {
                continue;
            };
            match column {
                // Lowest alias rank wins when two headers alias one column
                Some((column, rank)) => {
                    if ranked.get(column).is_none_or(|(best, _)| rank < best) {
                        ranked.insert(*column, (*rank, value));
                    }
                }
                None => {
                    extra.insert(name.clone(), value);
                }
            }
        }
        Ok(RawCsvRow {
            fields: ranked
                .into_iter()
                .map(|(column, (_, value))| (column, value))
                .collect(),
            extra,
        })
    }

    fn take(&mut self, column: Column) -> Option<String> {
        self.fields.remove(&column)
    }

    /// Converts into a [`Record`]. Any `year` cell is discarded; the year is
    /// derived from `publish_time`.
    pub(crate) fn into_record(mut self) -> Record {
        let publish_time = self
            .take(Column::PublishTime)
            .and_then(|value| parse_publish_date(&value));

        let record = Record {
            id: self.take(Column::Id).unwrap_or_else(|| nanoid!()),
            title: self.take(Column::Title),
            abstract_text: self.take(Column::Abstract),
            journal: self.take(Column::Journal),
            authors: self.take(Column::Authors),
            source: self.take(Column::Source),
            extra_fields: self.extra,
            ..Default::default()
        };
        record.with_publish_time(publish_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    fn layout(headers: &[&str]) -> HeaderLayout {
        HeaderLayout::new(&create_test_record(headers), &CsvConfig::new())
    }

    #[test]
    fn test_from_record_basic() {
        let layout = layout(&["title", "journal", "doi"]);
        let record = create_test_record(&["Test Article", "", "10.1/x"]);

        let raw = RawCsvRow::from_record(&layout, &record).unwrap();
        assert_eq!(raw.fields.get(&Column::Title), Some(&"Test Article".to_string()));
        assert_eq!(raw.fields.get(&Column::Journal), None);
        assert_eq!(raw.extra.get("doi"), Some(&"10.1/x".to_string()));
    }

    #[test]
    fn test_preferred_alias_value_wins() {
        let layout = layout(&["source", "source_x"]);
        let record = create_test_record(&["PMC", "WHO"]);

        let raw = RawCsvRow::from_record(&layout, &record).unwrap();
        assert_eq!(raw.fields.get(&Column::Source), Some(&"PMC".to_string()));

        let record = create_test_record(&["", "WHO"]);
        let raw = RawCsvRow::from_record(&layout, &record).unwrap();
        assert_eq!(raw.fields.get(&Column::Source), Some(&"WHO".to_string()));
    }

    #[test]
    fn test_alias_rank_beats_file_order() {
        let layout = layout(&["date", "title", "publish_time"]);
        let record = create_test_record(&["2019-01-01", "Paper", "2020-06-15"]);

        let record = RawCsvRow::from_record(&layout, &record)
            .unwrap()
            .into_record();
        assert_eq!(record.publish_time(), NaiveDate::from_ymd_opt(2020, 6, 15));
        assert_eq!(record.year(), Some(2020));

        let fallback = create_test_record(&["2019-01-01", "Paper", ""]);
        let record = RawCsvRow::from_record(&layout, &fallback)
            .unwrap()
            .into_record();
        assert_eq!(record.year(), Some(2019));
    }

    #[test]
    fn test_na_markers_are_null() {
        let layout = layout(&["title", "journal", "license"]);
        let record = create_test_record(&["Paper", "NA", "NaN"]);

        let raw = RawCsvRow::from_record(&layout, &record).unwrap();
        assert_eq!(raw.fields.get(&Column::Journal), None);
        assert!(raw.extra.is_empty());
        assert_eq!(raw.into_record().journal_or_unknown(), "Unknown");
    }

    #[test]
    fn test_from_record_too_many_fields() {
        let layout = layout(&["title"]);
        let record = create_test_record(&["Test Article", "Extra Field"]);

        let result = RawCsvRow::from_record(&layout, &record);
        assert!(matches!(result, Err(MetadataError::MalformedInput { .. })));
    }

    #[test]
    fn test_conversion_to_record() {
        let layout = layout(&["cord_uid", "title", "publish_time", "year"]);
        let record = create_test_record(&["abc", "Test Article", "2019-12-31", "2042"]);

        let record = RawCsvRow::from_record(&layout, &record)
            .unwrap()
            .into_record();
        assert_eq!(record.id(), "abc");
        assert_eq!(record.publish_time(), NaiveDate::from_ymd_opt(2019, 12, 31));
        assert_eq!(record.year(), Some(2019));
    }

    #[test]
    fn test_extra_columns() {
        let layout = layout(&["title", "pmcid", "license"]);
        assert_eq!(layout.extra_columns(), vec!["pmcid", "license"]);
    }
}
