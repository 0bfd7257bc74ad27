//! sr-train - trains relatedness normalizers against gold datasets.
//!
//! # Usage
//!
//! ```bash
//! # Train the local trigram metric on every configured dataset
//! sr-train -m trigram
//!
//! # Train local and universal metrics on two datasets, capped at 100 results
//! sr-train -m trigram -u trigram -g wordsim353.txt,MC.txt -r 100
//!
//! # Explicit configuration file, JSON report
//! sr-train --config ./sr-train.toml -m trigram --json
//! ```

mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use relatedness_core::MetricSelection;
use relatedness_core::MetricTrainer;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Train similarity and most-similar normalizers for relatedness metrics.
///
/// At least one of --metric or --universal is required.
#[derive(Parser, Debug)]
#[command(name = "sr-train", version, about)]
struct Cli {
    /// Local (single-language) metric to train
    #[arg(short = 'm', long = "metric")]
    metric: Option<String>,

    /// Universal (cross-lingual) metric to train
    #[arg(short = 'u', long)]
    universal: Option<String>,

    /// Gold dataset names to train on (default: every configured dataset)
    #[arg(short = 'g', long = "gold", value_delimiter = ',')]
    gold: Vec<String>,

    /// Maximum number of most-similar results per query
    #[arg(short = 'r', long = "max-results")]
    max_results: Option<usize>,

    /// Configuration file (default: $SR_TRAIN_CONFIG, then platform config dir, then ./sr-train.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output the training report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn selection(&self) -> MetricSelection {
        MetricSelection {
            local: self.metric.clone(),
            universal: self.universal.clone(),
            datasets: self.gold.clone(),
            max_results: self.max_results,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = config::find_config(cli.config.as_ref())?;
    info!("Using configuration {}", config_path.display());
    let trainer_config = config::load_config(&config_path)?;

    let trainer =
        MetricTrainer::from_config(trainer_config).context("Failed to set up the trainer")?;
    let selection = cli.selection();
    let report = trainer.run(&selection).context("Training failed")?;

    let output = if cli.json {
        output::format_json(&selection, &report)
    } else {
        output::format_human(&report)
    };
    println!("{}", output);

    Ok(())
}
