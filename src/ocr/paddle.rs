//! Subprocess OCR backend.
//!
//! Launches an external PaddleOCR-style recognizer once per image. Each
//! invocation gets its own temp result and stderr-capture files, a wall
//! clock limit, and guaranteed cleanup: the temp files are removed when
//! their guards drop, on success, failure, or panic alike.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use regex::Regex;
use tempfile::Builder;

use super::{InvocationError, OcrBackend};
use crate::config::OcrCommandConfig;

/// Matches the recognizer's tuple-style result payload, e.g. `('KA01X', 0.98)`.
const TUPLE_RESULT_PATTERN: &str = r"[\(\[]\s*'([^']*)'\s*,\s*[0-9.]+\s*[\)\]]";

/// Trailing bytes of stderr kept for diagnostics on failure.
const STDERR_TAIL_BYTES: u64 = 2048;

/// Poll interval while waiting for the child process.
const WAIT_POLL: Duration = Duration::from_millis(50);

pub struct PaddleBackend {
    config: OcrCommandConfig,
    scratch_dir: PathBuf,
}

impl PaddleBackend {
    pub fn new(config: OcrCommandConfig, scratch_dir: &Path) -> Self {
        Self {
            config,
            scratch_dir: scratch_dir.to_path_buf(),
        }
    }

    fn build_command(&self, image: &Path, result_file: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.arg(&self.config.script);
        cmd.arg(format!("--image_dir={}", image.display()));
        if let Some(dir) = &self.config.det_model_dir {
            cmd.arg(format!("--det_model_dir={dir}"));
        }
        if let Some(dir) = &self.config.cls_model_dir {
            cmd.arg(format!("--cls_model_dir={dir}"));
        }
        if let Some(dir) = &self.config.rec_model_dir {
            cmd.arg(format!("--rec_model_dir={dir}"));
        }
        if let Some(path) = &self.config.rec_char_dict_path {
            cmd.arg(format!("--rec_char_dict_path={path}"));
        }
        cmd.arg(format!("--output_file={}", result_file.display()));
        cmd.args(&self.config.extra_args);
        cmd
    }

    fn wait_with_timeout(
        child: &mut Child,
        timeout_ms: u64,
    ) -> Result<ExitStatus, InvocationError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // Kill may race a normal exit; reap either way.
                let _ = child.kill();
                let _ = child.wait();
                return Err(InvocationError::Timeout { timeout_ms });
            }
            thread::sleep(WAIT_POLL);
        }
    }

    /// Extracts the predicted plate from the recognizer's result file.
    ///
    /// Accepts either `image_path<ws>prediction` lines or the tuple payload
    /// the recognizer prints (`('TEXT', score)`). A line that cannot be
    /// split into both fields counts as an empty prediction rather than a
    /// failure, keeping the batch total stable. `None` means no usable line
    /// at all.
    fn parse_result(contents: &str) -> Option<String> {
        let line = contents.lines().find(|l| !l.trim().is_empty())?;

        if let Ok(tuple) = Regex::new(TUPLE_RESULT_PATTERN) {
            if let Some(caps) = tuple.captures(line) {
                return Some(caps[1].to_string());
            }
        }

        let mut fields = line.split_whitespace();
        let _image_path = fields.next()?;
        Some(fields.next().unwrap_or("").to_string())
    }
}

impl OcrBackend for PaddleBackend {
    fn recognize(&self, image: &Path) -> Result<String, InvocationError> {
        let result_file = Builder::new()
            .prefix("ocr_result_")
            .suffix(".txt")
            .tempfile_in(&self.scratch_dir)?;
        let stderr_file = Builder::new()
            .prefix("ocr_stderr_")
            .suffix(".log")
            .tempfile_in(&self.scratch_dir)?;

        let mut cmd = self.build_command(image, result_file.path());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::from(stderr_file.reopen()?));
        debug!("invoking recognizer: {:?}", cmd);

        let mut child = cmd.spawn().map_err(InvocationError::Spawn)?;
        let status = Self::wait_with_timeout(&mut child, self.config.timeout_ms)?;

        if !status.success() {
            let stderr_tail = read_tail(stderr_file.path(), STDERR_TAIL_BYTES);
            return Err(InvocationError::ExitStatus { status, stderr_tail });
        }

        let contents = fs::read_to_string(result_file.path())?;
        match Self::parse_result(&contents) {
            Some(prediction) => Ok(prediction),
            None => Err(InvocationError::MissingOutput),
        }
    }
}

/// Reads up to the last `limit` bytes of a file, lossily decoded.
fn read_tail(path: &Path, limit: u64) -> String {
    let Ok(file) = fs::File::open(path) else {
        return String::new();
    };
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut buf = Vec::new();
    let mut reader = file;
    if len > limit {
        use std::io::Seek;
        let _ = reader.seek(std::io::SeekFrom::Start(len - limit));
    }
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrCommandConfig;
    use tempfile::tempdir;

    #[test]
    fn test_parse_result_two_fields() {
        assert_eq!(
            PaddleBackend::parse_result("/tmp/a.png KA01AB1234\n"),
            Some("KA01AB1234".to_string())
        );
        assert_eq!(
            PaddleBackend::parse_result("/tmp/a.png\tKA01AB1234"),
            Some("KA01AB1234".to_string())
        );
    }

    #[test]
    fn test_parse_result_tuple_payload() {
        assert_eq!(
            PaddleBackend::parse_result("Predicts of /tmp/a.png:('KA01AB1234', 0.9987)"),
            Some("KA01AB1234".to_string())
        );
    }

    #[test]
    fn test_parse_result_malformed_line_is_empty_prediction() {
        // Only the image path made it to the line: empty prediction, not an error.
        assert_eq!(
            PaddleBackend::parse_result("/tmp/a.png\n"),
            Some(String::new())
        );
    }

    #[test]
    fn test_parse_result_no_usable_line() {
        assert_eq!(PaddleBackend::parse_result(""), None);
        assert_eq!(PaddleBackend::parse_result("\n  \n"), None);
    }

    #[cfg(unix)]
    fn script_backend(dir: &Path, body: &str, timeout_ms: u64) -> PaddleBackend {
        let script = dir.join("recognizer.sh");
        std::fs::write(&script, body).unwrap();
        PaddleBackend::new(
            OcrCommandConfig {
                program: "sh".to_string(),
                script: script.to_string_lossy().into_owned(),
                det_model_dir: None,
                cls_model_dir: None,
                rec_model_dir: None,
                rec_char_dict_path: None,
                extra_args: Vec::new(),
                timeout_ms,
            },
            dir,
        )
    }

    #[cfg(unix)]
    const ECHO_SCRIPT: &str = r#"
for arg in "$@"; do
  case "$arg" in
    --image_dir=*) img="${arg#--image_dir=}" ;;
    --output_file=*) out="${arg#--output_file=}" ;;
  esac
done
printf '%s AB123\n' "$img" > "$out"
"#;

    #[cfg(unix)]
    #[test]
    fn test_recognize_reads_result_file() {
        let dir = tempdir().unwrap();
        let backend = script_backend(dir.path(), ECHO_SCRIPT, 10_000);

        let prediction = backend.recognize(Path::new("/tmp/plate.png")).unwrap();
        assert_eq!(prediction, "AB123");
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_nonzero_exit() {
        let dir = tempdir().unwrap();
        let backend = script_backend(dir.path(), "echo 'model load failed' >&2\nexit 3\n", 10_000);

        let err = backend.recognize(Path::new("/tmp/plate.png")).unwrap_err();
        match err {
            InvocationError::ExitStatus { stderr_tail, .. } => {
                assert!(stderr_tail.contains("model load failed"));
            }
            other => panic!("expected ExitStatus, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_timeout_kills_child() {
        let dir = tempdir().unwrap();
        let backend = script_backend(dir.path(), "sleep 30\n", 200);

        let start = Instant::now();
        let err = backend.recognize(Path::new("/tmp/plate.png")).unwrap_err();
        assert!(matches!(err, InvocationError::Timeout { timeout_ms: 200 }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_empty_output_is_missing() {
        let dir = tempdir().unwrap();
        let backend = script_backend(dir.path(), "exit 0\n", 10_000);

        let err = backend.recognize(Path::new("/tmp/plate.png")).unwrap_err();
        assert!(matches!(err, InvocationError::MissingOutput));
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_cleans_scratch_files() {
        let dir = tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let script = dir.path().join("recognizer.sh");
        std::fs::write(&script, ECHO_SCRIPT).unwrap();
        let backend = PaddleBackend::new(
            OcrCommandConfig {
                program: "sh".to_string(),
                script: script.to_string_lossy().into_owned(),
                det_model_dir: None,
                cls_model_dir: None,
                rec_model_dir: None,
                rec_char_dict_path: None,
                extra_args: Vec::new(),
                timeout_ms: 10_000,
            },
            &scratch,
        );

        backend.recognize(Path::new("/tmp/plate.png")).unwrap();

        let leftovers = std::fs::read_dir(&scratch).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
