//! Per-item evaluation: one (image, label) pair to one outcome.
//!
//! Every failure here is recovered into an outcome for the item involved.
//! Nothing propagates past this boundary, so the batch always completes
//! with exactly one outcome per input item.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use tempfile::Builder;

use crate::config::EvalConfig;
use crate::dataset::DatasetItem;
use crate::ocr::{OcrBackend, enhance_contrast};
use crate::score::{normalize, score};

/// A scored comparison between ground truth and a present prediction.
#[derive(Clone, Debug, Serialize)]
pub struct DiscrepancyRecord {
    pub image_id: String,
    pub ground_truth: String,
    pub prediction: String,
    pub discrepancy: usize,
}

/// No usable prediction for this image.
#[derive(Clone, Debug, Serialize)]
pub struct NoPlateRecord {
    pub image_id: String,
    pub ground_truth: String,
    /// `Some("")` when the backend returned a literal empty prediction,
    /// `None` when the invocation itself failed or produced nothing.
    pub prediction: Option<String>,
}

/// The item could not be evaluated at all (missing or unreadable input).
#[derive(Clone, Debug, Serialize)]
pub struct ErrorRecord {
    pub image_id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub enum ItemOutcome {
    Scored(DiscrepancyRecord),
    NoPlate(NoPlateRecord),
    Failed(ErrorRecord),
}

impl ItemOutcome {
    pub fn image_id(&self) -> &str {
        match self {
            ItemOutcome::Scored(r) => &r.image_id,
            ItemOutcome::NoPlate(r) => &r.image_id,
            ItemOutcome::Failed(r) => &r.image_id,
        }
    }
}

/// Evaluates a single dataset item.
///
/// Reads and normalizes the ground truth, contrast-enhances the image into
/// a per-item scratch file, invokes the OCR backend on it, and scores the
/// normalized prediction. The scratch file is removed when its guard drops,
/// on every exit path.
pub fn evaluate_item(
    item: &DatasetItem,
    backend: &dyn OcrBackend,
    scratch_dir: &Path,
    config: &EvalConfig,
) -> ItemOutcome {
    let ground_truth = match fs::read_to_string(&item.label_path) {
        Ok(raw) => normalize(raw.trim()),
        Err(e) => {
            return failed(
                item,
                format!("cannot read label {}: {}", item.label_path.display(), e),
            );
        }
    };

    let image = match image::open(&item.image_path) {
        Ok(img) => img,
        Err(e) => {
            return failed(
                item,
                format!("cannot read image {}: {}", item.image_path.display(), e),
            );
        }
    };

    let enhanced = enhance_contrast(&image, config.contrast_boost);

    // Unique name per item so concurrent workers never collide.
    let scratch = match Builder::new()
        .prefix(&format!("contrasted_{}_", item.image_id))
        .suffix(".png")
        .tempfile_in(scratch_dir)
    {
        Ok(file) => file,
        Err(e) => return failed(item, format!("cannot create scratch file: {e}")),
    };
    if let Err(e) = enhanced.save(scratch.path()) {
        return failed(item, format!("cannot write preprocessed image: {e}"));
    }

    let prediction = match backend.recognize(scratch.path()) {
        Ok(text) => normalize(&text),
        Err(e) => {
            warn!("OCR invocation failed for {}: {}", item.image_id, e);
            return ItemOutcome::NoPlate(NoPlateRecord {
                image_id: item.image_id.clone(),
                ground_truth,
                prediction: None,
            });
        }
    };

    if prediction.is_empty() {
        return ItemOutcome::NoPlate(NoPlateRecord {
            image_id: item.image_id.clone(),
            ground_truth,
            prediction: Some(prediction),
        });
    }

    let (lcs_length, discrepancy) = score(&ground_truth, &prediction);
    if config.debug {
        info!(
            "{}: real={} predicted={} lcs={} discrepancy={}",
            item.image_id, ground_truth, prediction, lcs_length, discrepancy
        );
    }
    ItemOutcome::Scored(DiscrepancyRecord {
        image_id: item.image_id.clone(),
        ground_truth,
        prediction,
        discrepancy,
    })
}

fn failed(item: &DatasetItem, reason: String) -> ItemOutcome {
    warn!("{}: {}", item.image_id, reason);
    ItemOutcome::Failed(ErrorRecord {
        image_id: item.image_id.clone(),
        reason,
    })
}
