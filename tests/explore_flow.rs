use std::fs;
use std::sync::Arc;

use cordex::aggregate::{by_year, journal_choices, top_journals, year_bounds};
use cordex::csv::write_dataset_to_path;
use cordex::words::{StopWords, TextField, top_words, word_cloud_weights};
use cordex::{DatasetCache, FilterCriteria, JournalFilter, load};

const CLEANED_SAMPLE: &str = "\
cord_uid,title,abstract,publish_time,authors,journal,source_x,year
a1,COVID-19 Impact on Care,Hospital capacity,2020-03-01,Doe J,Vaccine,PMC,2020
a2,COVID-19 Vaccine Trials,Phase three results,2021-02-11,Roe R,Vaccine,PMC,2021
a3,Masks and Transmission,,2020-07-19,Poe P,BMJ,Elsevier,2020
a4,Long COVID Outcomes,Follow up cohort,2022-01-05,Loe L,,WHO,2022
a5,Vaccine Hesitancy Survey,Online survey,2021-09-30,Moe M,Vaccine,Medline,2021
";

fn write_sample(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("cleaned_sample.csv");
    fs::write(&path, CLEANED_SAMPLE).expect("failed writing cleaned sample");
    path
}

#[test]
fn filter_then_aggregate() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let dataset = load(write_sample(temp.path())).expect("sample should load");

    assert_eq!(year_bounds(&dataset), 2020..=2022);
    assert_eq!(journal_choices(&dataset, 100), vec!["All", "Vaccine", "BMJ", "Unknown"]);

    let criteria = FilterCriteria::new(2020..=2021, JournalFilter::from("Vaccine"));
    let filtered = dataset.filter(&criteria);
    let ids: Vec<_> = filtered.iter().map(|record| record.id()).collect();
    assert_eq!(ids, vec!["a1", "a2", "a5"]);

    assert_eq!(by_year(&filtered).into_vec(), vec![(2020, 1), (2021, 2)]);
    assert_eq!(
        top_journals(&filtered, 15).into_vec(),
        vec![("Vaccine".to_string(), 3)]
    );

    let words = top_words(&filtered, TextField::Title, 30, &StopWords::new());
    let leaders: Vec<_> = words
        .iter()
        .take(2)
        .map(|entry| (entry.word.as_str(), entry.count))
        .collect();
    assert_eq!(leaders, vec![("covid", 2), ("vaccine", 2)]);
    assert!(words.iter().skip(2).all(|entry| entry.count == 1));
    assert!(words.iter().all(|entry| entry.word != "19" && entry.word != "on"));
}

#[test]
fn unknown_journal_is_selectable() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let dataset = load(write_sample(temp.path())).expect("sample should load");

    let criteria = FilterCriteria::new(2019..=2022, JournalFilter::from("Unknown"));
    let filtered = dataset.filter(&criteria);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.records()[0].id(), "a4");
}

#[test]
fn empty_selection_has_no_word_cloud() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let dataset = load(write_sample(temp.path())).expect("sample should load");

    let criteria = FilterCriteria::new(2030..=2031, JournalFilter::All);
    let filtered = dataset.filter(&criteria);
    assert!(filtered.is_empty());
    assert!(by_year(&filtered).is_empty());
    assert!(word_cloud_weights(&filtered, TextField::Title, 200, &StopWords::new()).is_empty());
}

#[test]
fn export_reloads_to_same_records() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let dataset = load(write_sample(temp.path())).expect("sample should load");
    let filtered = dataset.filter(&FilterCriteria::new(2021..=2022, JournalFilter::All));

    let export_path = temp.path().join("cord19_filtered.csv");
    write_dataset_to_path(&filtered, &export_path).expect("export should succeed");
    let reloaded = load(&export_path).expect("export should load");

    assert_eq!(reloaded.len(), filtered.len());
    for (before, after) in filtered.iter().zip(reloaded.iter()) {
        assert_eq!(before.id(), after.id());
        assert_eq!(before.title(), after.title());
        assert_eq!(before.publish_time(), after.publish_time());
        assert_eq!(before.journal(), after.journal());
    }
}

#[test]
fn cache_reloads_only_on_path_change() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let path = write_sample(temp.path());
    let mut cache = DatasetCache::new();

    let first = cache.load(&path).expect("first load should succeed");
    let again = cache.load(&path).expect("cached load should succeed");
    assert!(Arc::ptr_eq(&first, &again));

    let other = temp.path().join("other.csv");
    fs::copy(&path, &other).expect("failed copying sample");
    let reloaded = cache.load(&other).expect("other path should load");
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(cache.cached_path(), Some(other.as_path()));
}
