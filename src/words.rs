//! Title and abstract word frequencies.
//!
//! Text is lower-cased and split into runs of word characters (`\w+`, so
//! `COVID-19` yields `covid` and `19`). A token is counted only if it is
//! longer than two characters, is not purely numeric, and is not a stopword.
//! Rankings are by descending count; equal counts are ordered by token text.
//!
//! ```
//! use cordex::{Dataset, Record};
//! use cordex::words::{top_words, StopWords, TextField};
//!
//! let dataset = Dataset::from_records(vec![
//!     Record::new("a").with_title("COVID-19 Impact"),
//!     Record::new("b").with_title("COVID-19 Vaccine"),
//! ]);
//!
//! let table = top_words(&dataset, TextField::Title, 5, &StopWords::new());
//! let pairs: Vec<(&str, usize)> = table.iter().map(|w| (w.word.as_str(), w.count)).collect();
//! assert_eq!(pairs, vec![("covid", 2), ("impact", 1), ("vaccine", 1)]);
//! ```

use itertools::Itertools;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::Record;
use crate::regex::Regex;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Tokens of this many characters or fewer are ignored.
const MIN_TOKEN_LEN: usize = 2;

/// Words kept for a word cloud unless the caller asks otherwise.
pub const DEFAULT_CLOUD_WORDS: usize = 200;

/// Common English function words.
const ENGLISH_STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are",
    "because", "been", "before", "being", "below", "between", "both", "but", "can", "could",
    "did", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "into", "its", "itself", "just", "more", "most", "not", "now", "off", "once", "only",
    "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "too", "under", "until", "very",
    "via", "was", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Which free-text field of a [`Record`] to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextField {
    Title,
    Abstract,
}

impl TextField {
    pub fn value(self, record: &Record) -> Option<&str> {
        match self {
            TextField::Title => record.title(),
            TextField::Abstract => record.abstract_text(),
        }
    }
}

/// A set of tokens excluded from counting. Entries are stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Common English function words such as "the", "and" or "with".
    #[must_use]
    pub fn english() -> Self {
        ENGLISH_STOPWORDS.iter().copied().collect()
    }

    pub fn insert(&mut self, word: &str) -> bool {
        self.0.insert(word.to_lowercase())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> Extend<&'a str> for StopWords {
    fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word);
        }
    }
}

impl<'a> FromIterator<&'a str> for StopWords {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut stopwords = StopWords::new();
        stopwords.extend(iter);
        stopwords
    }
}

/// Splits already lower-cased text into `\w+` runs.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    WORD_REGEX.find_iter(text).map(|m| m.as_str())
}

/// Whether `token` is counted: longer than two characters, not entirely
/// numeric, and not a stopword.
pub fn is_countable(token: &str, stopwords: &StopWords) -> bool {
    token.chars().count() > MIN_TOKEN_LEN
        && !token.chars().all(char::is_numeric)
        && !stopwords.contains(token)
}

/// A token and the number of times it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Tokens ranked by descending count, ties by ascending token text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable(Vec<WordCount>);

impl FrequencyTable {
    pub fn as_slice(&self) -> &[WordCount] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<WordCount> {
        self.0
    }

    /// Each word with its count divided by the highest count, in table order.
    /// The first entry always has weight `1.0`.
    pub fn relative_weights(&self) -> Vec<(String, f64)> {
        let Some(max) = self.0.first().map(|w| w.count as f64) else {
            return Vec::new();
        };
        self.0
            .iter()
            .map(|w| (w.word.clone(), w.count as f64 / max))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = &'a WordCount;
    type IntoIter = std::slice::Iter<'a, WordCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Accumulates token counts across many texts.
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    counts: HashMap<String, usize>,
}

impl WordCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower-cases `text` and counts its countable tokens.
    pub fn add_text(&mut self, text: &str, stopwords: &StopWords) {
        let lowered = text.to_lowercase();
        for token in tokenize(&lowered).filter(|t| is_countable(t, stopwords)) {
            match self.counts.get_mut(token) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(token.to_string(), 1);
                }
            }
        }
    }

    /// The `n` most frequent tokens.
    pub fn top(self, n: usize) -> FrequencyTable {
        let ranked = self
            .counts
            .into_iter()
            .k_smallest_by(n, |(a_word, a_count), (b_word, b_count)| {
                b_count.cmp(a_count).then_with(|| a_word.cmp(b_word))
            })
            .map(|(word, count)| WordCount { word, count })
            .collect();
        FrequencyTable(ranked)
    }
}

/// Counts the tokens of `field` across `records` and returns the `n` most
/// frequent. Records where the field is missing contribute nothing.
pub fn top_words<'a, I>(records: I, field: TextField, n: usize, stopwords: &StopWords) -> FrequencyTable
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counter = WordCounter::new();
    for text in records.into_iter().filter_map(|record| field.value(record)) {
        counter.add_text(text, stopwords);
    }
    counter.top(n)
}

/// The `max_words` most frequent tokens of `field`, weighted relative to the
/// most frequent one, for a word-cloud renderer. Empty when there is no text.
pub fn word_cloud_weights<'a, I>(
    records: I,
    field: TextField,
    max_words: usize,
    stopwords: &StopWords,
) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a Record>,
{
    top_words(records, field, max_words, stopwords).relative_weights()
}
