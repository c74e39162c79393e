//! Size-constrained encoder.
//!
//! Given a decoded image, its original format and a byte budget, produces the
//! highest-fidelity grayscale encoding that fits.
//!
//! # Algorithm
//!
//! ```text
//! DynamicImage ──► to_grayscale ──► default encode ──fits──► Fitted (Default)
//!                                        │
//!                                     too big
//!                                        ▼
//!                              quality search 1..=95 ──fits──► Fitted (QualitySearch)
//!                                        │
//!                                     nothing fits
//!                                        ▼
//!                  ┌──► resize ×0.9 (Lanczos3) ──► quality search ──fits──► Fitted (Downscaled)
//!                  │         │                            │
//!                  └─────────┼────────── nothing fits ◄───┘
//!                            │
//!                    side < 10 px ──► Unsatisfiable
//! ```
//!
//! The encoder is pure: it only produces byte buffers. Reading and replacing
//! files is the pipeline's job.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use tracing::{debug, info};

use crate::error::EncodeError;
use crate::format::ImageKind;

use super::budget::SizeBudget;
use super::codec::{GrayCodec, MAX_QUALITY};
use super::search::{search_quality, EncodingAttempt};

/// Smallest width or height the fallback will resize to.
pub const MIN_DIMENSION: u32 = 10;

/// Scale applied to both sides at each fallback level.
pub const DOWNSCALE_FACTOR: f64 = 0.9;

// =============================================================================
// Outcome Types
// =============================================================================

/// How a fitting encoding was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// Default encoder settings already fit; no search ran
    Default,

    /// Quality search at the original resolution
    QualitySearch,

    /// Quality search after `levels` rounds of downscaling
    Downscaled { levels: u32 },
}

/// A grayscale encoding within budget.
#[derive(Debug, Clone)]
pub struct Fitted {
    /// Encoded output, same format as the input
    pub bytes: Bytes,

    /// Quality used, or `None` for the default settings
    pub quality: Option<u8>,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Path through the algorithm that produced this result
    pub strategy: FitStrategy,
}

impl Fitted {
    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a size-constrained encode.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    /// An encoding within budget was found
    Fitted(Fitted),

    /// Nothing fits down to the minimum dimension
    Unsatisfiable {
        /// Width of the smallest level tried
        width: u32,
        /// Height of the smallest level tried
        height: u32,
        /// Number of downscaling rounds performed
        levels: u32,
    },
}

// =============================================================================
// Size-Constrained Encoder
// =============================================================================

/// Fits images under a byte budget by grayscale conversion, quality search
/// and iterative downscaling.
///
/// # Example
///
/// ```
/// use image::{DynamicImage, RgbImage, Rgb};
/// use shrinkwatch::format::ImageKind;
/// use shrinkwatch::shrink::{FitOutcome, SizeBudget, SizeConstrainedEncoder};
///
/// let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([200, 10, 10])));
/// let encoder = SizeConstrainedEncoder::new(SizeBudget::from_kb(50).unwrap());
///
/// match encoder.fit(img, ImageKind::Jpeg).unwrap() {
///     FitOutcome::Fitted(fitted) => assert!(fitted.size() <= 50 * 1024),
///     FitOutcome::Unsatisfiable { .. } => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SizeConstrainedEncoder {
    budget: SizeBudget,
}

impl SizeConstrainedEncoder {
    /// Create an encoder for the given budget.
    pub fn new(budget: SizeBudget) -> Self {
        Self { budget }
    }

    /// The byte budget.
    pub fn budget(&self) -> SizeBudget {
        self.budget
    }

    /// Encode `image` as `kind` within the budget.
    ///
    /// # Arguments
    ///
    /// * `image` - Decoded image in any color mode
    /// * `kind` - Format to write; the same as the source file's
    ///
    /// # Returns
    ///
    /// `FitOutcome::Fitted` with the best encoding found, or
    /// `FitOutcome::Unsatisfiable` when even the smallest allowed resolution
    /// is too large at quality 1.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` only if a codec fails.
    pub fn fit(&self, image: DynamicImage, kind: ImageKind) -> Result<FitOutcome, EncodeError> {
        let codec = GrayCodec::new(kind);
        let gray = to_grayscale(image);

        if gray.width() == 0 || gray.height() == 0 {
            return Ok(FitOutcome::Unsatisfiable {
                width: gray.width(),
                height: gray.height(),
                levels: 0,
            });
        }

        // Fast path
        let default = codec.encode_default(&gray)?;
        debug!(
            "{} default encoding: {} bytes (budget {})",
            kind,
            default.len(),
            self.budget
        );
        if self.budget.fits(default.len() as u64) {
            return Ok(FitOutcome::Fitted(Fitted {
                bytes: Bytes::from(default),
                quality: None,
                width: gray.width(),
                height: gray.height(),
                strategy: FitStrategy::Default,
            }));
        }

        info!(
            "{:.2} KB exceeds the {} limit, searching quality",
            default.len() as f64 / 1024.0,
            self.budget
        );

        if let Some(attempt) = self.search_level(&codec, &gray)? {
            return Ok(FitOutcome::Fitted(fitted(
                attempt,
                &gray,
                FitStrategy::QualitySearch,
            )));
        }

        // Resolution fallback
        let mut current = gray;
        let mut levels = 0;
        loop {
            let Some((width, height)) = next_dimensions(current.width(), current.height()) else {
                return Ok(FitOutcome::Unsatisfiable {
                    width: current.width(),
                    height: current.height(),
                    levels,
                });
            };

            current = imageops::resize(&current, width, height, FilterType::Lanczos3);
            levels += 1;
            info!("no quality fits, downscaled to {}x{}", width, height);

            if let Some(attempt) = self.search_level(&codec, &current)? {
                return Ok(FitOutcome::Fitted(fitted(
                    attempt,
                    &current,
                    FitStrategy::Downscaled { levels },
                )));
            }
        }
    }

    /// Best fitting encoding of `img` at its current resolution.
    fn search_level(
        &self,
        codec: &GrayCodec,
        img: &GrayImage,
    ) -> Result<Option<EncodingAttempt>, EncodeError> {
        if codec.kind().has_quality() {
            return search_quality(self.budget, |quality| codec.encode(img, quality));
        }

        // Size does not depend on quality: one encode decides, and a fit is
        // reported at the ceiling the search would converge to.
        let bytes = codec.encode(img, MAX_QUALITY)?;
        let fits = self.budget.fits(bytes.len() as u64);
        Ok(fits.then_some(EncodingAttempt {
            quality: MAX_QUALITY,
            bytes,
        }))
    }
}

fn fitted(attempt: EncodingAttempt, img: &GrayImage, strategy: FitStrategy) -> Fitted {
    Fitted {
        bytes: Bytes::from(attempt.bytes),
        quality: Some(attempt.quality),
        width: img.width(),
        height: img.height(),
        strategy,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Convert to single-channel 8-bit grayscale.
///
/// Images that already are `Luma8` pass through without copying.
pub fn to_grayscale(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => other.to_luma8(),
    }
}

/// Dimensions of the next fallback level, or `None` below the minimum.
///
/// Each side is scaled by [`DOWNSCALE_FACTOR`] and rounded down.
pub fn next_dimensions(width: u32, height: u32) -> Option<(u32, u32)> {
    let width = (width as f64 * DOWNSCALE_FACTOR) as u32;
    let height = (height as f64 * DOWNSCALE_FACTOR) as u32;

    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        None
    } else {
        Some((width, height))
    }
}

// =============================================================================
// Tests
// =============================================================================
