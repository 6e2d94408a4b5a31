//! Recognition engine boundary.
//!
//! The engine is an external capability: a bitmap goes in, text and a
//! bounded progress signal come out. This module holds the contract
//! ([`RecognitionEngine`]), the validated parameter profile
//! ([`RecognitionParams`]), the Tesseract adapter, and the process-wide
//! handle registry that amortizes engine initialization across calls.

mod backend;
pub mod registry;
mod tesseract;

pub use backend::{
    EngineError, EngineMode, RecognitionEngine, RecognitionParams, SegmentationMode,
};
pub use registry::EngineHandle;
pub use tesseract::TesseractEngine;
