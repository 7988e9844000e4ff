//! Stream-Features: Windowed feature extraction for video-streaming flows.
//!
//! This tool reads per-session packet metadata dumps produced by a capture
//! preprocessor, locates the flow carrying the video stream, and reduces its
//! first N seconds to a fixed-width vector of per-window statistics for
//! downstream traffic classifiers.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐     ┌───────────┐     ┌───────────┐     ┌───────────┐
//! │  Dataset  │────>│  Locator  │────>│  Window   │────>│   Stats   │
//! │  (serde)  │     │(heuristic)│     │ (buckets) │     │ (moments) │
//! └───────────┘     └───────────┘     └───────────┘     └───────────┘
//! ```
//!
//! - **Dataset**: Loads the `*_packetStats.json` flow map for one session
//! - **Locator**: Picks the video flow via port and DNS-shape heuristics
//! - **Window**: Buckets downstream packets into fixed-width time windows
//! - **Stats**: Reduces each window to named summary statistics

mod config;
mod dataset;
mod error;
mod export;
mod features;
mod locator;
mod stats;
mod window;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

use crate::config::Config;
use crate::export::OutputFormat;
use crate::locator::FlowLocator;

/// Stream-Features: windowed statistical features from video-streaming flows.
#[derive(Parser, Debug)]
#[command(name = "stream-features")]
#[command(author = "Traffic Analysis Team")]
#[command(version = "0.1.0")]
#[command(about = "Extract windowed statistical features from video-streaming flows")]
#[command(long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract window attributes from a single capture.
    Extract {
        /// Packet stats file, or capture directory containing one.
        #[arg(short, long)]
        file: PathBuf,

        /// Window width in seconds.
        #[arg(short, long)]
        window_size: Option<f64>,

        /// Horizon in seconds; only the first n seconds of the flow are examined.
        #[arg(short = 'n', long)]
        first_n_seconds: Option<f64>,

        /// Output format: csv, json.
        #[arg(short, long)]
        output: Option<String>,

        /// Print the attribute table to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Walk a directory tree and extract attributes for every capture in it.
    Batch {
        /// Root of the capture data directory.
        #[arg(short, long)]
        path: PathBuf,

        /// Window width in seconds.
        #[arg(short, long)]
        window_size: Option<f64>,

        /// Horizon in seconds; only the first n seconds of each flow are examined.
        #[arg(short = 'n', long)]
        first_n_seconds: Option<f64>,

        /// Regenerate attribute files that already exist.
        #[arg(long)]
        overwrite: bool,
    },

    /// Print the default configuration as TOML.
    GenerateConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = Config::load_or_default(cli.config.as_deref());
    config.validate()?;

    match cli.command {
        Commands::Extract {
            file,
            window_size,
            first_n_seconds,
            output,
            stdout,
        } => run_extract(&config, file, window_size, first_n_seconds, output, stdout),

        Commands::Batch {
            path,
            window_size,
            first_n_seconds,
            overwrite,
        } => run_batch(&config, path, window_size, first_n_seconds, overwrite),

        Commands::GenerateConfig => {
            print!("{}", Config::generate_default());
            Ok(())
        }
    }
}

fn resolve_format(config: &Config, output: Option<String>) -> Result<OutputFormat> {
    match output {
        Some(raw) => raw
            .parse::<OutputFormat>()
            .map_err(|e| anyhow::anyhow!("invalid --output format: {}", e)),
        None => Ok(config.output.format),
    }
}

fn run_extract(
    config: &Config,
    file: PathBuf,
    window_size: Option<f64>,
    first_n_seconds: Option<f64>,
    output: Option<String>,
    stdout: bool,
) -> Result<()> {
    let window_size = window_size.unwrap_or(config.window.window_size);
    let first_n_seconds = first_n_seconds.unwrap_or(config.window.first_n_seconds);
    let format = resolve_format(config, output)?;

    let locator = FlowLocator::new(config.locator.clone())?;
    let features =
        features::generate_window_attributes(&file, &locator, window_size, first_n_seconds)?;

    if stdout {
        print!("{}", export::render(&features, format)?);
        return Ok(());
    }

    let stats_path = dataset::resolve_stats_path(&file)?;
    let output_path = export::derive_output_path(&stats_path, format);
    export::write_features(&output_path, &features, format)?;
    info!(
        "wrote {} attributes to {}",
        features.len(),
        output_path.display()
    );
    Ok(())
}

fn run_batch(
    config: &Config,
    path: PathBuf,
    window_size: Option<f64>,
    first_n_seconds: Option<f64>,
    overwrite: bool,
) -> Result<()> {
    let window_size = window_size.unwrap_or(config.window.window_size);
    let first_n_seconds = first_n_seconds.unwrap_or(config.window.first_n_seconds);
    // Reject bad windowing once up front instead of once per capture.
    features::validate_windowing(window_size, first_n_seconds)?;

    let format = config.output.format;
    let locator = FlowLocator::new(config.locator.clone())?;

    let mut extracted = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for entry in WalkDir::new(&path).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !file_name.ends_with(dataset::STATS_FILE_SUFFIX) {
            continue;
        }

        let output_path = export::derive_output_path(entry.path(), format);
        if !overwrite && output_path.exists() {
            info!(
                "output {} already exists, skipping",
                output_path.display()
            );
            skipped += 1;
            continue;
        }

        // Failures are isolated per capture; the sweep continues.
        let result = features::generate_window_attributes(
            entry.path(),
            &locator,
            window_size,
            first_n_seconds,
        )
        .and_then(|features| export::write_features(&output_path, &features, format));

        match result {
            Ok(()) => {
                info!("extracted {}", output_path.display());
                extracted += 1;
            }
            Err(e) => {
                warn!("skipping {}: {:#}", entry.path().display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "batch complete: {} extracted, {} skipped, {} failed",
        extracted, skipped, failed
    );
    Ok(())
}
