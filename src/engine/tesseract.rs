//! Tesseract recognition engine adapter.
//!
//! Drives the Tesseract OCR binary for text recognition. The CLI surface
//! reports no incremental progress, so the adapter emits a single terminal
//! fraction; callers that need finer granularity interpolate around it.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::backend::{EngineError, RecognitionEngine, RecognitionParams};
use super::registry::{self, EngineHandle};

/// Recognition engine backed by the Tesseract binary.
pub struct TesseractEngine {
    handle: Arc<EngineHandle>,
    language: String,
}

impl TesseractEngine {
    /// Create an adapter for the given language profile.
    ///
    /// Acquires the shared engine handle (initializing it on first use) and
    /// verifies the language is installed.
    pub async fn new(language: &str) -> Result<Self, EngineError> {
        let handle = registry::acquire().await?;
        if !handle.has_language(language) {
            return Err(EngineError::InitFailed(format!(
                "language '{language}' is not installed (tesseract --list-langs)"
            )));
        }
        Ok(Self {
            handle,
            language: language.to_string(),
        })
    }

    /// Whether the Tesseract binary is on PATH, without touching the
    /// shared handle.
    pub fn binary_available() -> bool {
        which::which("tesseract").is_ok()
    }

    fn build_command(&self, bitmap: &Path, params: &RecognitionParams) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(self.handle.binary());
        cmd.arg(bitmap)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &params.segmentation.psm().to_string()])
            .args(["--oem", &params.engine_mode.oem().to_string()]);

        if let Some(whitelist) = &params.char_whitelist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={whitelist}"));
        }
        if params.preserve_interword_spaces {
            cmd.args(["-c", "preserve_interword_spaces=1"]);
        }
        cmd
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(
        &self,
        bitmap: &Path,
        params: &RecognitionParams,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> Result<String, EngineError> {
        let output = match self.build_command(bitmap, params).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::Unavailable(
                    "tesseract disappeared from PATH".to_string(),
                ));
            }
            Err(e) => return Err(EngineError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::RecognitionFailed(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        progress(1.0);
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
