//! textlift - local text extraction from images and PDF documents.
//!
//! Routes an input file by media type, drives a Tesseract-backed
//! recognition engine over single images or rasterized PDF pages, corrects
//! systematic recognition errors in the output, and reports monotonic
//! progress while it works. Everything runs on the local machine; nothing
//! is persisted beyond the call.

pub mod cli;
pub mod config;
pub mod engine;
pub mod media;
pub mod normalize;
pub mod pipeline;
pub mod raster;

pub use engine::{
    EngineError, EngineMode, RecognitionEngine, RecognitionParams, SegmentationMode,
    TesseractEngine,
};
pub use normalize::normalize;
pub use pipeline::{ExtractError, ExtractionPipeline, ExtractionResult, InputFile};
pub use raster::{PageRasterizer, PopplerRasterizer, RasterPage, RenderError};
