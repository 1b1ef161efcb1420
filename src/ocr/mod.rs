//! OCR backend abstraction.
//!
//! The evaluation pipeline depends only on the [`OcrBackend`] capability, so
//! the recognizer can be swapped (subprocess, in-process model, remote
//! service) without touching the pipeline. The shipped implementation is
//! [`PaddleBackend`], which launches an external recognizer process per
//! image.

pub mod paddle;
pub mod preprocess;

pub use paddle::PaddleBackend;
pub use preprocess::enhance_contrast;

use std::path::Path;
use thiserror::Error;

/// Why a single OCR invocation produced no usable prediction.
///
/// These never abort the batch; the item evaluator maps them to a no-plate
/// outcome for the one image involved.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("failed to launch OCR process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("OCR process exited with {status}: {stderr_tail}")]
    ExitStatus {
        status: std::process::ExitStatus,
        stderr_tail: String,
    },
    #[error("OCR process exceeded {timeout_ms} ms and was killed")]
    Timeout { timeout_ms: u64 },
    #[error("OCR process produced no parseable output")]
    MissingOutput,
    #[error("I/O error during OCR invocation: {0}")]
    Io(#[from] std::io::Error),
}

/// A black-box plate recognizer for one image at a time.
pub trait OcrBackend: Send + Sync {
    /// Runs recognition on a single image file.
    ///
    /// The success string may be empty: the backend ran fine but saw no
    /// readable plate text. Errors cover process launch failure, non-zero
    /// exit, timeout, and unparseable output.
    fn recognize(&self, image: &Path) -> Result<String, InvocationError>;
}
