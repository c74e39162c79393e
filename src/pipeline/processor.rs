//! Per-file processing.
//!
//! Loads one image, runs the size-constrained encoder and atomically replaces
//! the file with the result. A result identical to the file on disk is not
//! written. Failures leave the original byte-for-byte untouched.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::ProcessError;
use crate::format::{detect_kind, ImageKind};
use crate::shrink::{FitOutcome, FitStrategy, Fitted, SizeBudget, SizeConstrainedEncoder};

/// Prefix of temporary files created next to the target during replacement.
pub const TEMP_FILE_PREFIX: &str = ".shrinkwatch-";

// =============================================================================
// Outcome
// =============================================================================

/// Successful result of processing one file.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// File was rewritten with a grayscale encoding within budget
    Replaced(Replacement),

    /// The chosen encoding equals the file's current bytes; nothing written
    AlreadyCompliant { size: u64 },
}

/// Details of a rewritten file.
#[derive(Debug, Clone)]
pub struct Replacement {
    /// Format of the file (unchanged by processing)
    pub kind: ImageKind,

    /// Size before processing
    pub original_size: u64,

    /// Width before processing
    pub original_width: u32,

    /// Height before processing
    pub original_height: u32,

    /// Whether the source had to be converted to grayscale
    pub converted: bool,

    /// Encoding that was written
    pub fitted: Fitted,
}

// =============================================================================
// Image Processor
// =============================================================================

/// Shrinks image files in place to fit a byte budget.
///
/// Processing is synchronous; callers on an async runtime should move it to
/// a blocking thread.
#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    encoder: SizeConstrainedEncoder,
}

impl ImageProcessor {
    /// Create a processor for the given budget.
    pub fn new(budget: SizeBudget) -> Self {
        Self {
            encoder: SizeConstrainedEncoder::new(budget),
        }
    }

    /// The byte budget.
    pub fn budget(&self) -> SizeBudget {
        self.encoder.budget()
    }

    /// Process one file in place.
    ///
    /// # Errors
    ///
    /// - `ProcessError::Decode` if the file is not a supported, decodable image
    /// - `ProcessError::Unsatisfiable` if nothing fits above the minimum size
    /// - `ProcessError::Io` / `ProcessError::Encode` for unexpected failures
    ///
    /// In every error case the file is left unmodified.
    pub fn process_file(&self, path: &Path) -> Result<ProcessOutcome, ProcessError> {
        let data = fs::read(path)?;
        let original_size = data.len() as u64;

        let kind = detect_kind(&data)?;
        let image = image::load_from_memory_with_format(&data, kind.image_format()).map_err(
            |e| ProcessError::Decode {
                message: e.to_string(),
            },
        )?;

        let (original_width, original_height) = (image.width(), image.height());
        let grayscale = is_grayscale(&image, kind);

        info!(
            "{}: {} {}x{}, {:.2} KB",
            path.display(),
            kind,
            original_width,
            original_height,
            original_size as f64 / 1024.0
        );

        if !grayscale {
            info!("{}: converting to grayscale", path.display());
        }

        match self.encoder.fit(image, kind)? {
            FitOutcome::Fitted(fitted) if fitted.bytes.as_ref() == data.as_slice() => {
                debug!("{}: encoding unchanged, not rewriting", path.display());
                Ok(ProcessOutcome::AlreadyCompliant {
                    size: original_size,
                })
            }
            FitOutcome::Fitted(fitted) => {
                replace_file(path, &fitted.bytes)?;
                Ok(ProcessOutcome::Replaced(Replacement {
                    kind,
                    original_size,
                    original_width,
                    original_height,
                    converted: !grayscale,
                    fitted,
                }))
            }
            FitOutcome::Unsatisfiable {
                width,
                height,
                levels,
            } => Err(ProcessError::Unsatisfiable {
                budget: self.budget().bytes(),
                width,
                height,
                levels,
            }),
        }
    }
}

impl Replacement {
    /// One-line description for logs.
    pub fn summary(&self) -> String {
        let size_kb = self.fitted.size() as f64 / 1024.0;
        match (self.fitted.strategy, self.fitted.quality) {
            (FitStrategy::Default, _) => {
                format!("saved at default settings ({:.2} KB)", size_kb)
            }
            (FitStrategy::QualitySearch, Some(quality)) => {
                format!("saved at quality {} ({:.2} KB)", quality, size_kb)
            }
            (FitStrategy::Downscaled { .. }, Some(quality)) => format!(
                "saved at {}x{} and quality {} ({:.2} KB)",
                self.fitted.width, self.fitted.height, quality, size_kb
            ),
            (_, None) => format!(
                "saved at {}x{} ({:.2} KB)",
                self.fitted.width, self.fitted.height, size_kb
            ),
        }
    }
}

/// Whether `image` already holds only gray levels.
///
/// BMP and GIF store gray as a palette and decode to RGB or RGBA, so for those
/// an opaque image with equal channels counts. Only used for reporting.
fn is_grayscale(image: &DynamicImage, kind: ImageKind) -> bool {
    let palette_based = matches!(kind, ImageKind::Bmp | ImageKind::Gif);

    match image {
        DynamicImage::ImageLuma8(_) => true,
        DynamicImage::ImageRgb8(rgb) if palette_based => {
            rgb.pixels().all(|p| p[0] == p[1] && p[1] == p[2])
        }
        DynamicImage::ImageRgba8(rgba) if palette_based => rgba
            .pixels()
            .all(|p| p[0] == p[1] && p[1] == p[2] && p[3] == u8::MAX),
        _ => false,
    }
}

// =============================================================================
// Atomic Replace
// =============================================================================

/// Replace the contents of `path` with `data` atomically.
///
/// The data is written to a temporary file in the same directory, flushed to
/// disk, given the original's permissions, and renamed over the original. A
/// crash at any point leaves either the old or the new file, never a partial
/// one.
pub fn replace_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(directory)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
