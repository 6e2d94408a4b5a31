//! Page rasterization for paged documents.
//!
//! Recognition engines want bitmaps, so each PDF page is rendered to PNG
//! before recognition. Rendering happens at an upscale factor above the
//! page's native resolution; the extra pixels cost render time and buy
//! recognition accuracy. Rendered surfaces live in a per-call temp
//! directory owned by the returned [`RasterPage`], so dropping the value
//! releases the surface.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;

/// Errors raised while rendering a document page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page renderer not available: {0}")]
    NoSurface(String),

    #[error("could not read page count: {0}")]
    PageCount(String),

    #[error("failed to render page {page}: {message}")]
    RenderFailed { page: u32, message: String },

    #[error("no bitmap produced for page {0}")]
    EncodeFailed(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered page bitmap plus the transient surface that holds it.
///
/// The backing directory is removed when this value drops; the bitmap path
/// is only valid for the value's lifetime.
#[derive(Debug)]
pub struct RasterPage {
    path: PathBuf,
    _surface: TempDir,
}

impl RasterPage {
    pub fn new(surface: TempDir, path: PathBuf) -> Self {
        Self {
            path,
            _surface: surface,
        }
    }

    /// Path of the rendered bitmap.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Renders single pages of a paged document to bitmaps.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError>;

    /// Render one page (1-based) at the given upscale factor.
    async fn rasterize(
        &self,
        document: &Path,
        page: u32,
        scale: f32,
    ) -> Result<RasterPage, RenderError>;
}

/// Rasterizer backed by Poppler's `pdftoppm` and `pdfinfo`.
#[derive(Debug, Default)]
pub struct PopplerRasterizer;

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Availability of the required Poppler binaries.
    pub fn check_tools() -> Vec<(&'static str, bool)> {
        ["pdftoppm", "pdfinfo"]
            .iter()
            .map(|tool| (*tool, which::which(tool).is_ok()))
            .collect()
    }

    /// Find the bitmap `pdftoppm` produced for a page.
    ///
    /// Output names are zero-padded to the width of the document's last
    /// page number (page-1.png, page-01.png, ...), so probe the widths.
    fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
        for digits in [1, 2, 3, 4] {
            let filename = format!("page-{:0width$}.png", page, width = digits);
            let path = dir.join(&filename);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    fn dpi_for(scale: f32) -> u32 {
        // 72 dpi is the PDF native point grid; the factor is clamped to a
        // range that stays useful for recognition without exhausting memory.
        (72.0 * scale.clamp(1.0, 8.0)).round() as u32
    }
}

#[async_trait]
impl PageRasterizer for PopplerRasterizer {
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError> {
        let output = match tokio::process::Command::new("pdfinfo")
            .arg(document)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::NoSurface(
                    "pdfinfo not found (install poppler-utils)".to_string(),
                ));
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        if !output.status.success() {
            return Err(RenderError::PageCount(format!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if let Some(rest) = line.strip_prefix("Pages:") {
                return rest
                    .trim()
                    .parse()
                    .map_err(|_| RenderError::PageCount(format!("unparseable page count: {rest}")));
            }
        }
        Err(RenderError::PageCount(
            "pdfinfo output had no Pages line".to_string(),
        ))
    }

    async fn rasterize(
        &self,
        document: &Path,
        page: u32,
        scale: f32,
    ) -> Result<RasterPage, RenderError> {
        let surface = TempDir::new()?;
        let prefix = surface.path().join("page");
        let page_str = page.to_string();
        let dpi = Self::dpi_for(scale).to_string();

        let output = match tokio::process::Command::new("pdftoppm")
            .args(["-png", "-r", &dpi, "-f", &page_str, "-l", &page_str])
            .arg(document)
            .arg(&prefix)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::NoSurface(
                    "pdftoppm not found (install poppler-utils)".to_string(),
                ));
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        if !output.status.success() {
            return Err(RenderError::RenderFailed {
                page,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let path = Self::find_page_image(surface.path(), page)
            .ok_or(RenderError::EncodeFailed(page))?;
        Ok(RasterPage::new(surface, path))
    }
}
