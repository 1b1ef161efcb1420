//! Tabular output: CSV files and the review list.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::eval::{DiscrepancyRecord, ErrorRecord, NoPlateRecord};

const DISCREPANCY_HEADER: &str = "image,actual,predicted,discrepancy";
const NO_PLATE_HEADER: &str = "image,actual,predicted";
const ERROR_HEADER: &str = "image,reason";

/// Writes all scored records, one row per image.
pub fn write_discrepancy_csv(path: &Path, records: &[DiscrepancyRecord]) -> Result<()> {
    let mut file = create(path)?;
    writeln!(file, "{DISCREPANCY_HEADER}")?;
    for record in records {
        writeln!(
            file,
            "{},{},{},{}",
            record.image_id, record.ground_truth, record.prediction, record.discrepancy
        )?;
    }
    Ok(())
}

/// Writes the no-plate report; the predicted column is blank for
/// invocation failures and for literal empty predictions alike.
pub fn write_no_plate_csv(path: &Path, records: &[NoPlateRecord]) -> Result<()> {
    let mut file = create(path)?;
    writeln!(file, "{NO_PLATE_HEADER}")?;
    for record in records {
        writeln!(
            file,
            "{},{},{}",
            record.image_id,
            record.ground_truth,
            record.prediction.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}

/// Writes items that could not be evaluated at all.
pub fn write_error_csv(path: &Path, records: &[ErrorRecord]) -> Result<()> {
    let mut file = create(path)?;
    writeln!(file, "{ERROR_HEADER}")?;
    for record in records {
        // Reasons may contain commas; quote the field.
        writeln!(
            file,
            "{},\"{}\"",
            record.image_id,
            record.reason.replace('"', "\"\"")
        )?;
    }
    Ok(())
}

/// Writes the plain list of image ids needing manual review.
pub fn write_review_list<'a>(
    path: &Path,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut file = create(path)?;
    for id in ids {
        writeln!(file, "{id}")?;
    }
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).context(format!("Failed to create {}", path.display()))
}
