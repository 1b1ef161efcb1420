//! JSON export of the batch summary.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::eval::BatchSummary;

#[derive(Serialize)]
struct SummaryDocument<'a> {
    generated_at: String,
    #[serde(flatten)]
    summary: &'a BatchSummary,
}

/// Exports the summary to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_summary(summary: &BatchSummary, output_path: &Path) -> Result<()> {
    let document = SummaryDocument {
        generated_at: Local::now().to_rfc3339(),
        summary,
    };
    let json = serde_json::to_string_pretty(&document)
        .context("Failed to serialize summary to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create {}", output_path.display()))?;
    file.write_all(json.as_bytes())
        .context("Failed to write summary JSON")?;

    Ok(())
}
