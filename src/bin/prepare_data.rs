//! Clean and subsample a raw CORD-19 `metadata.csv`.
//!
//! ```bash
//! prepare-data --input metadata.csv --out data/cleaned_sample.csv --sample_frac 0.05
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cordex::clean::{CleanConfig, DEFAULT_SAMPLE_FRACTION, DEFAULT_SEED, clean};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

/// Drop rows without title or publish date, derive the year and write a
/// reproducible random sample.
#[derive(Parser, Debug)]
#[command(name = "prepare-data", version, about, long_about = None)]
struct Args {
    /// Path to metadata.csv
    #[arg(long)]
    input: PathBuf,

    /// Path to save cleaned sample
    #[arg(long)]
    out: PathBuf,

    /// Fraction of data to sample, in (0, 1]
    #[arg(long = "sample_frac", visible_alias = "sample-frac", default_value_t = DEFAULT_SAMPLE_FRACTION)]
    sample_frac: f64,

    /// Seed of the sampling generator
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
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
    debug!("arguments: {:?}", args);

    let mut config = CleanConfig::new();
    config.set_sample_fraction(args.sample_frac);
    let mut rng = StdRng::seed_from_u64(args.seed);

    println!("Loading data...");
    let counts = clean(&args.input, &args.out, &config, &mut rng).with_context(|| {
        format!(
            "failed to clean {} into {}",
            args.input.display(),
            args.out.display()
        )
    })?;

    println!("Original rows: {}", counts.rows_read);
    println!("Cleaned rows: {}", counts.rows_cleaned);
    println!("Saved cleaned data to {}", args.out.display());
    Ok(())
}
