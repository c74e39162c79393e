//! Format detection for watched image files.
//!
//! Two independent checks are made:
//!
//! - **By name**: only files whose extension is one of `png`, `jpg`, `jpeg`,
//!   `bmp` or `gif` (case-insensitive) are picked up by the watcher.
//! - **By content**: the output format is taken from the file's magic bytes,
//!   not from its extension, so a PNG saved as `photo.jpg` is rewritten as a
//!   PNG.

use std::path::Path;

use image::ImageFormat;

use crate::error::ProcessError;

/// Extensions picked up by the watcher.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

// =============================================================================
// ImageKind
// =============================================================================

/// Encoded format of a watched image.
///
/// The output of the size-constrained encoder always has the same kind as
/// its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Lossy, quality-parameterized
    Jpeg,

    /// Lossless, compression level only
    Png,

    /// Uncompressed
    Bmp,

    /// Palette-based, lossless
    Gif,
}

impl ImageKind {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Bmp => "BMP",
            ImageKind::Gif => "GIF",
        }
    }

    /// Whether the encoded size responds to the quality parameter.
    pub const fn has_quality(&self) -> bool {
        matches!(self, ImageKind::Jpeg)
    }

    /// Map an `image` crate format onto a supported kind.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Bmp => Some(ImageKind::Bmp),
            ImageFormat::Gif => Some(ImageKind::Gif),
            _ => None,
        }
    }

    /// The `image` crate format for this kind.
    pub const fn image_format(&self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Bmp => ImageFormat::Bmp,
            ImageKind::Gif => ImageFormat::Gif,
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Check whether a path names a file the watcher should process.
///
/// Only the extension is inspected; the file does not need to exist.
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Detect the encoded format of an image from its leading bytes.
///
/// # Errors
///
/// Returns `ProcessError::Decode` if the bytes do not start with the magic of
/// a supported format.
pub fn detect_kind(data: &[u8]) -> Result<ImageKind, ProcessError> {
    let format = image::guess_format(data).map_err(|e| ProcessError::Decode {
        message: e.to_string(),
    })?;

    ImageKind::from_image_format(format).ok_or_else(|| ProcessError::Decode {
        message: format!("unsupported image format {:?}", format),
    })
}

// =============================================================================
// Tests
// =============================================================================
