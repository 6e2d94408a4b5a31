//! Media type classification and detection.
//!
//! Routing decisions are made on the *declared* media type of an input;
//! detection from bytes/extension is only used when constructing an input
//! from a path on disk.

use std::path::Path;

/// Raster image types the recognition engine accepts directly.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/tiff",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// How an input's declared media type routes through extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// A single bitmap, recognized as-is.
    RasterImage,
    /// A multi-page document, rasterized one page at a time.
    PagedDocument,
    /// Anything else; rejected before any work is done.
    Unsupported,
}

/// Classify a declared media type.
///
/// Parameters such as `;charset=` are stripped before matching. Vector image
/// types (e.g. `image/svg+xml`) are not raster input and stay unsupported.
pub fn classify(media_type: &str) -> MediaKind {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase();

    if essence == "application/pdf" {
        MediaKind::PagedDocument
    } else if SUPPORTED_IMAGE_TYPES.contains(&essence.as_str()) {
        MediaKind::RasterImage
    } else {
        MediaKind::Unsupported
    }
}

/// Map a media type to a file extension for staged temp files.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/tiff" => "tif",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Detect the media type of a file read from disk.
///
/// Magic-byte detection wins over the extension; the extension is a fallback
/// for formats `infer` does not know.
pub fn detect(path: &Path, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
