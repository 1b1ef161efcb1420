//! Report generation for one batch run.
//!
//! This module provides:
//! - CSV output for scored, no-plate, and errored items
//! - Visual review pages and a bucket distribution chart
//! - JSON export of the full summary

pub mod csv;
pub mod export;
pub mod pages;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::EvalConfig;
use crate::dataset::DatasetItem;
use crate::eval::BatchSummary;
use crate::paths::OutputPaths;

/// Locations of everything a run wrote, for the final console summary.
pub struct ReportArtifacts {
    pub discrepancy_csv: PathBuf,
    pub no_plate_csv: PathBuf,
    pub error_csv: PathBuf,
    pub review_list: PathBuf,
    pub bucket_chart: PathBuf,
    pub summary_json: PathBuf,
    pub review_pages: Vec<PathBuf>,
}

/// Writes every report sink for the batch.
pub fn write_reports(
    summary: &BatchSummary,
    items: &[DatasetItem],
    paths: &OutputPaths,
    config: &EvalConfig,
) -> Result<ReportArtifacts> {
    csv::write_discrepancy_csv(&paths.discrepancy_csv(), &summary.scored)?;
    csv::write_no_plate_csv(&paths.no_plate_csv(), &summary.no_plate)?;
    csv::write_error_csv(&paths.error_csv(), &summary.errors)?;

    let review_ids = summary
        .scored
        .iter()
        .filter(|record| record.discrepancy > 0)
        .map(|record| record.image_id.as_str());
    csv::write_review_list(&paths.review_list(), review_ids)?;

    let review_pages = pages::render_review_pages(summary, items, paths, config.contrast_boost)?;
    pages::render_bucket_chart(&summary.bucket_counts, &paths.bucket_chart())?;
    export::export_summary(summary, &paths.summary_json())?;

    Ok(ReportArtifacts {
        discrepancy_csv: paths.discrepancy_csv(),
        no_plate_csv: paths.no_plate_csv(),
        error_csv: paths.error_csv(),
        review_list: paths.review_list(),
        bucket_chart: paths.bucket_chart(),
        summary_json: paths.summary_json(),
        review_pages,
    })
}
