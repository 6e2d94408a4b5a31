//! Extraction orchestration.
//!
//! Routes an input by its declared media type, drives the recognition
//! engine across one bitmap or a sequence of rasterized PDF pages, runs
//! every unit's raw text through the correction pass, and reports progress
//! through a monotonic `[0, 100]` callback. A failure anywhere abandons the
//! whole file; no partial text ever escapes.

mod progress;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::engine::{EngineError, RecognitionEngine, RecognitionParams};
use crate::media::{self, MediaKind};
use crate::normalize::normalize;
use crate::raster::{PageRasterizer, RenderError};

use progress::ProgressReporter;

/// Default upscale factor for rendering PDF pages before recognition.
pub const DEFAULT_RASTER_SCALE: f32 = 3.0;

/// Errors raised by an extraction call.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Recognition(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A byte-bearing input with a declared media type and display name.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub name: String,
}

impl InputFile {
    /// Wrap caller-supplied bytes. Content with no natural name (clipboard
    /// pastes and the like) should be given a fallback display name here.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            name: name.into(),
        }
    }

    /// Read a file from disk, detecting its media type from content with
    /// the extension as fallback.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let media_type = media::detect(path, &bytes);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
        Ok(Self {
            bytes,
            media_type,
            name,
        })
    }
}

/// The extracted text of one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Normalized text: pages in order, one blank line between them,
    /// trimmed.
    pub text: String,
    /// Display name of the source file.
    pub file_name: String,
    /// Recognition units processed (1 for a single image).
    pub pages: u32,
}

/// Drives recognition over images and paged documents.
///
/// One call processes one file; units within a call run strictly
/// sequentially. Batch callers invoke `process` once per file, which is
/// also the cooperative stop point between files.
pub struct ExtractionPipeline {
    engine: Arc<dyn RecognitionEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
    params: RecognitionParams,
    raster_scale: f32,
}

impl ExtractionPipeline {
    pub fn new(engine: Arc<dyn RecognitionEngine>, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            engine,
            rasterizer,
            params: RecognitionParams::default(),
            raster_scale: DEFAULT_RASTER_SCALE,
        }
    }

    /// Set the recognition parameter profile.
    pub fn with_params(mut self, params: RecognitionParams) -> Self {
        self.params = params;
        self
    }

    /// Set the page upscale factor used for paged documents.
    pub fn with_raster_scale(mut self, scale: f32) -> Self {
        self.raster_scale = scale;
        self
    }

    /// Extract text without progress reporting.
    pub async fn process(&self, input: &InputFile) -> Result<ExtractionResult, ExtractError> {
        self.process_with_progress(input, |_| {}).await
    }

    /// Extract text, reporting progress percentages in `[0, 100]`.
    ///
    /// Reported values never decrease within a call, advance at least once
    /// per page, and end at exactly 100 only when the call succeeds.
    pub async fn process_with_progress<F>(
        &self,
        input: &InputFile,
        on_progress: F,
    ) -> Result<ExtractionResult, ExtractError>
    where
        F: FnMut(f64) + Send,
    {
        let mut reporter = ProgressReporter::new(on_progress);
        match media::classify(&input.media_type) {
            MediaKind::Unsupported => {
                Err(ExtractError::UnsupportedType(input.media_type.clone()))
            }
            MediaKind::RasterImage => self.process_image(input, &mut reporter).await,
            MediaKind::PagedDocument => self.process_document(input, &mut reporter).await,
        }
    }

    /// Write the input's bytes to a scoped temp file for the engine and
    /// rasterizer to read. Removed when the extraction call ends.
    fn stage(&self, input: &InputFile) -> Result<tempfile::NamedTempFile, ExtractError> {
        let mut staged = tempfile::Builder::new()
            .prefix("textlift-")
            .suffix(&format!(".{}", media::extension_for(&input.media_type)))
            .tempfile()?;
        staged.write_all(&input.bytes)?;
        staged.flush()?;
        Ok(staged)
    }

    async fn process_image<F>(
        &self,
        input: &InputFile,
        reporter: &mut ProgressReporter<F>,
    ) -> Result<ExtractionResult, ExtractError>
    where
        F: FnMut(f64) + Send,
    {
        let staged = self.stage(input)?;
        tracing::debug!(file = %input.name, engine = self.engine.name(), "recognizing image");

        let raw = {
            let sink = &mut |fraction: f32| {
                reporter.report_partial(f64::from(fraction.clamp(0.0, 1.0)) * 100.0)
            };
            self.engine
                .recognize(staged.path(), &self.params, sink)
                .await?
        };

        let text = normalize(&raw).trim().to_string();
        reporter.report(100.0);
        Ok(ExtractionResult {
            text,
            file_name: input.name.clone(),
            pages: 1,
        })
    }

    async fn process_document<F>(
        &self,
        input: &InputFile,
        reporter: &mut ProgressReporter<F>,
    ) -> Result<ExtractionResult, ExtractError>
    where
        F: FnMut(f64) + Send,
    {
        let staged = self.stage(input)?;
        let page_count = self.rasterizer.page_count(staged.path()).await?;
        if page_count == 0 {
            return Err(RenderError::PageCount("document reports no pages".to_string()).into());
        }
        tracing::debug!(file = %input.name, pages = page_count, "processing paged document");

        let mut page_texts = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            reporter.report(progress::raster_entry(page, page_count));
            let bitmap = self
                .rasterizer
                .rasterize(staged.path(), page, self.raster_scale)
                .await?;

            let raw = {
                let sink = &mut |fraction: f32| {
                    reporter.report_partial(progress::recognition_within(
                        page, page_count, fraction,
                    ))
                };
                self.engine
                    .recognize(bitmap.path(), &self.params, sink)
                    .await?
            };

            page_texts.push(normalize(&raw).trim().to_string());
            reporter.report(progress::recognition_done(page, page_count));
        }

        let text = page_texts.join("\n\n").trim().to_string();
        reporter.report(100.0);
        Ok(ExtractionResult {
            text,
            file_name: input.name.clone(),
            pages: page_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::raster::RasterPage;

    /// Engine that replays scripted page texts and progress fractions.
    struct ScriptedEngine {
        texts: Mutex<Vec<String>>,
        fractions: Vec<f32>,
        calls: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(texts: &[&str]) -> Self {
            Self {
                texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
                fractions: vec![0.5, 1.0],
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecognitionEngine for ScriptedEngine {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn recognize(
            &self,
            _bitmap: &Path,
            _params: &RecognitionParams,
            progress: &mut (dyn FnMut(f32) + Send),
        ) -> Result<String, EngineError> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            for fraction in &self.fractions {
                progress(*fraction);
            }
            let texts = self.texts.lock().unwrap();
            texts
                .get(index)
                .cloned()
                .ok_or_else(|| EngineError::RecognitionFailed("script exhausted".to_string()))
        }
    }

    /// Rasterizer that fabricates empty bitmaps, optionally failing on one
    /// page.
    struct FakeRasterizer {
        pages: u32,
        fail_on: Option<u32>,
    }

    #[async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn page_count(&self, _document: &Path) -> Result<u32, RenderError> {
            Ok(self.pages)
        }

        async fn rasterize(
            &self,
            _document: &Path,
            page: u32,
            _scale: f32,
        ) -> Result<RasterPage, RenderError> {
            if self.fail_on == Some(page) {
                return Err(RenderError::RenderFailed {
                    page,
                    message: "scripted failure".to_string(),
                });
            }
            let surface = TempDir::new()?;
            let path = surface.path().join(format!("page-{page}.png"));
            std::fs::write(&path, b"bitmap")?;
            Ok(RasterPage::new(surface, path))
        }
    }

    fn pipeline(engine: Arc<ScriptedEngine>, pages: u32, fail_on: Option<u32>) -> ExtractionPipeline {
        ExtractionPipeline::new(engine, Arc::new(FakeRasterizer { pages, fail_on }))
    }

    fn pdf_input() -> InputFile {
        InputFile::new(b"%PDF-1.4 stub".to_vec(), "application/pdf", "doc.pdf")
    }

    fn image_input() -> InputFile {
        InputFile::new(vec![0x89, b'P', b'N', b'G'], "image/png", "scan.png")
    }

    #[tokio::test]
    async fn test_unsupported_type_fails_before_any_work() {
        let engine = Arc::new(ScriptedEngine::new(&["never"]));
        let pipeline = pipeline(engine.clone(), 1, None);
        let input = InputFile::new(b"hello".to_vec(), "text/plain", "notes.txt");

        let err = pipeline.process(&input).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(t) if t == "text/plain"));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_image_routes_to_single_unit() {
        let engine = Arc::new(ScriptedEngine::new(&["hello  world\n"]));
        let pipeline = pipeline(engine.clone(), 0, None);

        let result = pipeline.process(&image_input()).await.unwrap();
        assert_eq!(engine.call_count(), 1);
        assert_eq!(result.pages, 1);
        assert_eq!(result.file_name, "scan.png");
        assert_eq!(result.text, "hello  world");
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_order_with_blank_lines() {
        let engine = Arc::new(ScriptedEngine::new(&["A\n", "B\n", "C\n"]));
        let pipeline = pipeline(engine.clone(), 3, None);

        let result = pipeline.process(&pdf_input()).await.unwrap();
        assert_eq!(result.text, "A\n\nB\n\nC");
        assert_eq!(result.pages, 3);
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mid_document_render_failure_yields_no_result() {
        let engine = Arc::new(ScriptedEngine::new(&["A", "B", "C"]));
        let pipeline = pipeline(engine.clone(), 3, Some(2));

        let err = pipeline.process(&pdf_input()).await.unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Render(RenderError::RenderFailed { page: 2, .. })
        ));
        // Page 1 was recognized, then the whole call was abandoned.
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_engine_failure_maps_to_recognition_error() {
        let engine = Arc::new(ScriptedEngine::new(&[]));
        let pipeline = pipeline(engine, 0, None);

        let err = pipeline.process(&image_input()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Recognition(_)));
    }

    async fn observed_progress(pages: u32) -> Vec<f64> {
        let texts: Vec<String> = (1..=pages).map(|p| format!("page {p}")).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let engine = Arc::new(ScriptedEngine::new(&text_refs));
        let pipeline = pipeline(engine, pages, None);

        let seen = Mutex::new(Vec::new());
        pipeline
            .process_with_progress(&pdf_input(), |pct| seen.lock().unwrap().push(pct))
            .await
            .unwrap();
        seen.into_inner().unwrap()
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        for pages in [1, 5] {
            let seen = observed_progress(pages).await;
            assert!(!seen.is_empty());
            assert!(
                seen.windows(2).all(|w| w[0] < w[1]),
                "regression in {seen:?}"
            );
            assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
            assert_eq!(*seen.last().unwrap(), 100.0);
            assert_eq!(seen.iter().filter(|p| **p == 100.0).count(), 1);
            // At least one report per page.
            assert!(seen.len() >= pages as usize);
        }
    }

    #[tokio::test]
    async fn test_single_image_progress_completes_once() {
        let engine = Arc::new(ScriptedEngine::new(&["text"]));
        let pipeline = pipeline(engine, 0, None);

        let seen = Mutex::new(Vec::new());
        pipeline
            .process_with_progress(&image_input(), |pct| seen.lock().unwrap().push(pct))
            .await
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
        assert_eq!(seen.iter().filter(|p| **p == 100.0).count(), 1);
    }

    #[tokio::test]
    async fn test_page_text_runs_through_correction_pass() {
        let engine = Arc::new(ScriptedEngine::new(&["(l) first\n", "x ^ 2\n"]));
        let pipeline = pipeline(engine, 2, None);

        let result = pipeline.process(&pdf_input()).await.unwrap();
        assert_eq!(result.text, "(1) first\n\nx^2");
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let engine = Arc::new(ScriptedEngine::new(&[]));
        let pipeline = pipeline(engine, 0, None);

        let err = pipeline.process(&pdf_input()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Render(RenderError::PageCount(_))));
    }
}
