//! plate-eval
//!
//! Batch accuracy evaluation for license-plate OCR. Compares predicted
//! plate strings against ground-truth labels for a folder of images,
//! scores each pair with an LCS-based discrepancy measure, and writes
//! CSV, PNG, and JSON reports.

mod config;
mod dataset;
mod eval;
mod ocr;
mod paths;
mod report;
mod score;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::load_config;
use crate::eval::{BatchSummary, Bucket};
use crate::ocr::PaddleBackend;
use crate::paths::OutputPaths;
use crate::report::ReportArtifacts;

#[derive(Debug, Parser)]
#[command(
    name = "plate-eval",
    about = "Evaluate license-plate OCR accuracy against ground-truth labels"
)]
struct CliArgs {
    /// Directory containing the test images
    images_dir: PathBuf,

    /// Directory containing per-image ground-truth files (<image>.txt)
    labels_dir: PathBuf,

    /// Output directory for reports
    #[arg(short = 'o', long = "output", default_value = "output")]
    output: PathBuf,

    /// Override the configuration file path
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Number of OCR workers (defaults to the configured value, or one per core)
    #[arg(long = "workers")]
    workers: Option<usize>,

    /// Enable debug logging and per-item diagnostics
    #[arg(long = "debug")]
    debug: bool,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.debug { "debug" } else { "info" }),
    )
    .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let mut config = load_config(&config_path);
    config.debug |= args.debug;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    // Batch-level setup; any failure here aborts before a worker starts.
    let output_paths = OutputPaths::new(args.output.clone());
    output_paths
        .ensure_directories()
        .context(format!("Failed to create output directory {}", args.output.display()))?;
    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;

    let items = dataset::discover_items(&args.images_dir, &args.labels_dir)?;
    if items.is_empty() {
        warn!("no images found in {}", args.images_dir.display());
    }

    let worker_count = config.worker_count();
    info!("evaluating {} images with {} workers", items.len(), worker_count);

    let backend = PaddleBackend::new(config.ocr.clone(), scratch.path());
    let result = eval::run_batch(&items, worker_count, &backend, scratch.path(), &config);
    let summary = eval::aggregate(result);
    let artifacts = report::write_reports(&summary, &items, &output_paths, &config)?;

    print_summary(&summary, &artifacts, output_paths.root());
    Ok(())
}

/// Prints the final run summary. Always reached once the batch completes,
/// even when some items errored.
fn print_summary(summary: &BatchSummary, artifacts: &ReportArtifacts, output_root: &Path) {
    println!();
    println!("Evaluated {} images", summary.total_items);
    for bucket in Bucket::ALL {
        println!("  {:<4} {}", bucket.label(), summary.bucket_counts.get(bucket));
    }
    println!("  no plate detected: {}", summary.no_plate.len());
    println!("  errors: {}", summary.errors.len());
    println!("Accuracy: {:.2}%", summary.accuracy * 100.0);
    println!();
    println!("Reports written to {}", output_root.display());
    println!("  {}", artifacts.discrepancy_csv.display());
    println!("  {}", artifacts.no_plate_csv.display());
    println!("  {}", artifacts.error_csv.display());
    println!("  {}", artifacts.summary_json.display());
    println!("  {}", artifacts.bucket_chart.display());
    println!("  {} review pages", artifacts.review_pages.len());
}
