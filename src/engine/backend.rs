//! Recognition engine abstraction.
//!
//! The pipeline depends only on the [`RecognitionEngine`] contract; the
//! Tesseract adapter is the default implementation and tests substitute
//! scripted fakes.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a recognition engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recognition engine not available: {0}")]
    Unavailable(String),

    #[error("recognition engine failed to initialize: {0}")]
    InitFailed(String),

    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("invalid engine parameter: {0}")]
    InvalidParams(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assumed layout of text within a bitmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMode {
    /// Fully automatic page segmentation.
    #[default]
    Auto,
    /// A single uniform block of text.
    SingleBlock,
    /// A single text line.
    SingleLine,
    /// Sparse text in no particular order.
    Sparse,
}

impl SegmentationMode {
    /// Tesseract `--psm` value.
    pub fn psm(self) -> u8 {
        match self {
            Self::Auto => 3,
            Self::SingleBlock => 6,
            Self::SingleLine => 7,
            Self::Sparse => 11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::SingleBlock => "single-block",
            Self::SingleLine => "single-line",
            Self::Sparse => "sparse",
        }
    }
}

impl FromStr for SegmentationMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "single-block" => Ok(Self::SingleBlock),
            "single-line" => Ok(Self::SingleLine),
            "sparse" => Ok(Self::Sparse),
            other => Err(EngineError::InvalidParams(format!(
                "unknown segmentation mode '{other}' (expected auto, single-block, single-line or sparse)"
            ))),
        }
    }
}

/// Which recognition model family the engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineMode {
    /// Classic shape-based recognizer.
    Legacy,
    /// LSTM recognizer.
    #[default]
    Neural,
    /// Both recognizers combined.
    Combined,
}

impl EngineMode {
    /// Tesseract `--oem` value.
    pub fn oem(self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Neural => 1,
            Self::Combined => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Neural => "neural",
            Self::Combined => "combined",
        }
    }
}

impl FromStr for EngineMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "neural" => Ok(Self::Neural),
            "combined" => Ok(Self::Combined),
            other => Err(EngineError::InvalidParams(format!(
                "unknown engine mode '{other}' (expected legacy, neural or combined)"
            ))),
        }
    }
}

/// Structured recognition parameter profile.
///
/// Every field has a default; unknown keys in a deserialized profile are
/// rejected rather than silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RecognitionParams {
    /// Page segmentation mode.
    pub segmentation: SegmentationMode,
    /// Recognition model selection.
    pub engine_mode: EngineMode,
    /// Restrict recognition to these characters.
    pub char_whitelist: Option<String>,
    /// Keep the engine's inter-word spacing instead of collapsing it.
    pub preserve_interword_spaces: bool,
}

impl RecognitionParams {
    pub fn with_segmentation(mut self, mode: SegmentationMode) -> Self {
        self.segmentation = mode;
        self
    }

    pub fn with_engine_mode(mut self, mode: EngineMode) -> Self {
        self.engine_mode = mode;
        self
    }

    pub fn with_char_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.char_whitelist = Some(whitelist.into());
        self
    }
}

/// A text recognition capability.
///
/// `recognize` reports zero or more progress fractions in `[0, 1]` through
/// the callback before returning the final text.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Short engine name for logs and status output.
    fn name(&self) -> &'static str;

    /// Recognize the text in a bitmap file.
    async fn recognize(
        &self,
        bitmap: &Path,
        params: &RecognitionParams,
        progress: &mut (dyn FnMut(f32) + Send),
    ) -> Result<String, EngineError>;
}
