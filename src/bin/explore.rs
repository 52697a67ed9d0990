//! Summarize a cleaned CORD-19 sample from the command line.
//!
//! ```bash
//! explore --data data/cleaned_sample.csv --from 2020 --to 2021 --journal "Vaccine" \
//!     --export
//! ```
//!
//! A bare `--export` writes `cord19_filtered.csv` in the working directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cordex::aggregate::{DEFAULT_JOURNAL_CHOICES, by_year, journal_choices, top_journals, year_bounds};
use cordex::csv::{DEFAULT_EXPORT_FILE_NAME, write_dataset_to_path};
use cordex::words::{DEFAULT_CLOUD_WORDS, StopWords, TextField, top_words, word_cloud_weights};
use cordex::{Dataset, FilterCriteria, JournalFilter, Record, load};
use tracing::{info, warn};

/// Title words counted before the table is cut to `--words` rows.
const COUNTED_WORDS: usize = 30;

/// Rows of the data sample that may be printed.
const MAX_SAMPLE_ROWS: usize = 200;

/// A lightweight explorer for a cleaned CORD-19 metadata sample.
#[derive(Parser, Debug)]
#[command(name = "explore", version, about, long_about = None)]
struct Args {
    /// Path to cleaned CSV
    #[arg(long, default_value = "data/cleaned_sample.csv")]
    data: PathBuf,

    /// First year of the range (default: earliest year in the data)
    #[arg(long)]
    from: Option<i32>,

    /// Last year of the range (default: latest year in the data)
    #[arg(long)]
    to: Option<i32>,

    /// Journal to keep, or "All"
    #[arg(long, default_value = "All")]
    journal: String,

    /// Number of top journals to show
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u16).range(5..=50))]
    top_n: u16,

    /// Number of frequent title words to show
    #[arg(long, default_value_t = 20)]
    words: usize,

    /// Number of sample rows to print
    #[arg(long, default_value_t = 0)]
    sample: usize,

    /// Print the word-cloud weights of title words
    #[arg(long)]
    cloud: bool,

    /// List the journals available for --journal and exit
    #[arg(long)]
    list_journals: bool,

    /// Write the filtered records to this CSV file
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE_NAME)]
    export: Option<PathBuf>,
}

fn print_sample(filtered: &Dataset, rows: usize) {
    println!("\nSample of data");
    println!("publish_time\ttitle\tauthors\tjournal\tsource");
    for record in &filtered.head(rows.min(MAX_SAMPLE_ROWS)) {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record
                .publish_time()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            record.title().unwrap_or_default(),
            record.authors().unwrap_or_default(),
            record.journal().unwrap_or_default(),
            record.source().unwrap_or_default(),
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let dataset = load(&args.data)
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    info!("loaded {} papers from {}", dataset.len(), args.data.display());

    if args.list_journals {
        for journal in journal_choices(&dataset, DEFAULT_JOURNAL_CHOICES) {
            println!("{journal}");
        }
        return Ok(());
    }

    let bounds = year_bounds(&dataset);
    let from = args.from.unwrap_or(*bounds.start());
    let to = args.to.unwrap_or(*bounds.end());
    if from > to {
        warn!("year range {}-{} is empty", from, to);
    }

    let criteria = FilterCriteria::new(from..=to, JournalFilter::from(args.journal.clone()));
    let filtered = dataset.filter(&criteria);
    println!("Showing {} papers (years {}–{})", filtered.len(), from, to);

    println!("\nPublications by Year");
    for (year, count) in &by_year(&filtered) {
        println!("{year:>6}  {count}");
    }

    println!("\nTop {} Journals", args.top_n);
    for (journal, count) in &top_journals(&filtered, usize::from(args.top_n)) {
        println!("{count:>6}  {journal}");
    }

    let has_titles = filtered
        .iter()
        .filter_map(Record::title)
        .any(|title| !title.trim().is_empty());
    if !has_titles {
        println!("\nNo titles available in current filter.");
    } else {
        println!("\nMost frequent words in titles");
        let table = top_words(&filtered, TextField::Title, COUNTED_WORDS, &StopWords::new());
        for entry in table.iter().take(args.words) {
            println!("{:>6}  {}", entry.count, entry.word);
        }

        if args.cloud {
            println!("\nWord cloud weights");
            let weights =
                word_cloud_weights(&filtered, TextField::Title, DEFAULT_CLOUD_WORDS, &StopWords::new());
            for (word, weight) in &weights {
                println!("{weight:>6.3}  {word}");
            }
        }
    }

    if args.sample > 0 {
        print_sample(&filtered, args.sample);
    }

    if let Some(path) = &args.export {
        write_dataset_to_path(&filtered, path)
            .with_context(|| format!("failed to export to {}", path.display()))?;
        info!("exported {} papers to {}", filtered.len(), path.display());
    }

    Ok(())
}
