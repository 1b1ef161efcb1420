//! Output directory layout for one evaluation run.

use std::path::{Path, PathBuf};

/// All report locations, derived from the output root chosen on the CLI.
#[derive(Clone, Debug)]
pub struct OutputPaths {
    root: PathBuf,
}

impl OutputPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one review page image per flagged record.
    pub fn review_dir(&self) -> PathBuf {
        self.root.join("review")
    }

    pub fn review_page(&self, image_id: &str) -> PathBuf {
        self.review_dir().join(format!("{image_id}.png"))
    }

    pub fn discrepancy_csv(&self) -> PathBuf {
        self.root.join("discrepancies.csv")
    }

    pub fn no_plate_csv(&self) -> PathBuf {
        self.root.join("no_plate_detected.csv")
    }

    pub fn error_csv(&self) -> PathBuf {
        self.root.join("errors.csv")
    }

    pub fn review_list(&self) -> PathBuf {
        self.root.join("review_files.txt")
    }

    pub fn bucket_chart(&self) -> PathBuf {
        self.root.join("bucket_distribution.png")
    }

    pub fn summary_json(&self) -> PathBuf {
        self.root.join("summary.json")
    }

    /// Ensures all output directories exist. Call before any worker starts;
    /// a failure here aborts the whole run.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.review_dir())?;
        Ok(())
    }
}
