//! Evaluation configuration.
//!
//! Loaded from config.json at startup and threaded read-only through the
//! pipeline. Missing or unparseable files fall back to defaults with a
//! warning, so the tool stays runnable out of the box.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Command line for the external OCR recognizer.
///
/// Model and dictionary paths are forwarded to the child process unchanged;
/// they are opaque to the evaluation pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrCommandConfig {
    /// Interpreter or executable to launch
    pub program: String,
    /// Recognizer script, passed as the first argument
    pub script: String,
    /// Detection model directory (`--det_model_dir`)
    pub det_model_dir: Option<String>,
    /// Classification model directory (`--cls_model_dir`)
    pub cls_model_dir: Option<String>,
    /// Recognition model directory (`--rec_model_dir`)
    pub rec_model_dir: Option<String>,
    /// Character dictionary path (`--rec_char_dict_path`)
    pub rec_char_dict_path: Option<String>,
    /// Extra arguments appended verbatim
    pub extra_args: Vec<String>,
    /// Wall-clock limit for one invocation; the child is killed on expiry
    pub timeout_ms: u64,
}

impl Default for OcrCommandConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            script: "tools/infer/predict_rec.py".to_string(),
            det_model_dir: None,
            cls_model_dir: None,
            rec_model_dir: Some("./inference/en_PP-OCRv3_rec/".to_string()),
            rec_char_dict_path: Some("./ppocr/utils/en_dict.txt".to_string()),
            extra_args: Vec::new(),
            timeout_ms: 30_000,
        }
    }
}

/// Complete evaluation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// External recognizer command
    pub ocr: OcrCommandConfig,
    /// Worker pool size; 0 means one worker per CPU core
    pub workers: usize,
    /// Log a progress line every N collected outcomes
    pub progress_interval: usize,
    /// Contrast boost applied before OCR (percent, as `imageops::contrast`)
    pub contrast_boost: f32,
    /// Log every per-item outcome, not just periodic progress
    pub debug: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            ocr: OcrCommandConfig::default(),
            workers: 0,
            progress_interval: 100,
            contrast_boost: 12.0,
            debug: false,
        }
    }
}

impl EvalConfig {
    /// Resolved worker pool size: the configured value, or one per CPU core.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Loads configuration from the given path, or returns defaults.
pub fn load_config(path: &Path) -> EvalConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
            }
        }
    }
    EvalConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config.ocr.program, "python3");
        assert_eq!(config.ocr.timeout_ms, 30_000);
        assert_eq!(config.progress_interval, 100);
        assert!(!config.debug);
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"workers": 4, "ocr": {"program": "ocr-rec", "timeout_ms": 5000}}"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.workers, 4);
        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.ocr.program, "ocr-rec");
        assert_eq!(config.ocr.timeout_ms, 5000);
        // Untouched fields fall back to defaults.
        assert_eq!(config.ocr.script, "tools/infer/predict_rec.py");
        assert_eq!(config.progress_interval, 100);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = load_config(&path);
        assert_eq!(config.workers, 0);
    }

    #[test]
    fn test_auto_worker_count_is_positive() {
        let config = EvalConfig::default();
        assert!(config.worker_count() >= 1);
    }
}
