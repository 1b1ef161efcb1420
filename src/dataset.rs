//! Dataset discovery: pairing test images with their ground-truth labels.
//!
//! The label for `plates/xy12.jpg` is expected at `labels/xy12.txt`. Items
//! whose label file is missing are still listed; the evaluator turns them
//! into error records so no input is ever silently dropped.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Image extensions considered part of the dataset.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// One evaluable unit: an image and the path its label should live at.
#[derive(Clone, Debug)]
pub struct DatasetItem {
    /// File stem of the image, used to key every downstream record
    pub image_id: String,
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

/// Scans `images_dir` for dataset images and pairs each with its label path.
///
/// Returns items sorted by file name so every run presents the batch in the
/// same order. Fails only when the directory itself cannot be listed; that
/// is a batch-setup error and aborts the run.
pub fn discover_items(images_dir: &Path, labels_dir: &Path) -> Result<Vec<DatasetItem>> {
    let entries = std::fs::read_dir(images_dir)
        .context(format!("Failed to list images directory {}", images_dir.display()))?;

    let mut image_paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if is_dataset_image(&path) {
            image_paths.push(path);
        }
    }
    image_paths.sort();

    let items = image_paths
        .into_iter()
        .filter_map(|image_path| {
            let image_id = image_path.file_stem()?.to_string_lossy().into_owned();
            let label_path = labels_dir.join(format!("{image_id}.txt"));
            Some(DatasetItem {
                image_id,
                image_path,
                label_path,
            })
        })
        .collect();

    Ok(items)
}

fn is_dataset_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
