//! Grayscale image codec.
//!
//! This module encodes normalized 8-bit grayscale rasters into the format the
//! image arrived in, either at the format's default settings or at an explicit
//! quality level.
//!
//! # Design Decisions
//!
//! - **Same format out as in**: a JPEG stays a JPEG, a GIF stays a GIF.
//!
//! - **Quality only matters for JPEG**: PNG, BMP and GIF ignore the quality
//!   parameter. PNG switches to its best compression and adaptive filtering
//!   whenever a quality is requested, so size-constrained encodes are as small
//!   as the format allows.
//!
//! - **Luma8 input**: the codec only accepts single-channel 8-bit rasters.
//!   Conversion happens once, before any encoding, in the fit module.

use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, Frame, GrayImage, ImageEncoder, ImageError};

use crate::error::EncodeError;
use crate::format::ImageKind;

/// JPEG quality used when no quality is requested (the common codec default).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum quality considered by the search.
pub const MIN_QUALITY: u8 = 1;

/// Maximum quality considered by the search.
///
/// Above this JPEG output grows quickly for no visible gain.
pub const MAX_QUALITY: u8 = 95;

// =============================================================================
// Grayscale Codec
// =============================================================================

/// Encoder for grayscale rasters in a fixed output format.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use shrinkwatch::format::ImageKind;
/// use shrinkwatch::shrink::GrayCodec;
///
/// let img = GrayImage::from_pixel(16, 16, Luma([128]));
/// let codec = GrayCodec::new(ImageKind::Jpeg);
///
/// let jpeg = codec.encode(&img, 60).unwrap();
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GrayCodec {
    kind: ImageKind,
}

impl GrayCodec {
    /// Create a codec writing the given format.
    pub fn new(kind: ImageKind) -> Self {
        Self { kind }
    }

    /// The output format.
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Encode at the format's default settings.
    ///
    /// For JPEG this is quality [`DEFAULT_JPEG_QUALITY`]; the other formats
    /// use their default compression.
    pub fn encode_default(&self, img: &GrayImage) -> Result<Vec<u8>, EncodeError> {
        match self.kind {
            ImageKind::Jpeg => self.encode_jpeg(img, DEFAULT_JPEG_QUALITY),
            ImageKind::Png => self.encode_png(img, CompressionType::Default, FilterType::Adaptive),
            ImageKind::Bmp => self.encode_bmp(img),
            ImageKind::Gif => self.encode_gif(img),
        }
    }

    /// Encode at an explicit quality.
    ///
    /// # Arguments
    ///
    /// * `img` - Grayscale raster
    /// * `quality` - Quality level, clamped to `MIN_QUALITY..=MAX_QUALITY`
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::Codec` if the underlying encoder rejects the data.
    pub fn encode(&self, img: &GrayImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        let quality = clamp_quality(quality);

        match self.kind {
            ImageKind::Jpeg => self.encode_jpeg(img, quality),
            ImageKind::Png => self.encode_png(img, CompressionType::Best, FilterType::Adaptive),
            ImageKind::Bmp => self.encode_bmp(img),
            ImageKind::Gif => self.encode_gif(img),
        }
    }

    fn encode_jpeg(&self, img: &GrayImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, quality)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
            .map_err(|e| self.codec_error(e))?;
        Ok(output)
    }

    fn encode_png(
        &self,
        img: &GrayImage,
        compression: CompressionType,
        filter: FilterType,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut output = Vec::new();
        PngEncoder::new_with_quality(&mut output, compression, filter)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
            .map_err(|e| self.codec_error(e))?;
        Ok(output)
    }

    fn encode_bmp(&self, img: &GrayImage) -> Result<Vec<u8>, EncodeError> {
        let mut output = Vec::new();
        BmpEncoder::new(&mut output)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
            .map_err(|e| self.codec_error(e))?;
        Ok(output)
    }

    fn encode_gif(&self, img: &GrayImage) -> Result<Vec<u8>, EncodeError> {
        // The GIF encoder quantizes from RGBA; gray levels survive unchanged.
        let rgba = DynamicImage::ImageLuma8(img.clone()).to_rgba8();

        let mut output = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut output);
            encoder
                .encode_frame(Frame::new(rgba))
                .map_err(|e| self.codec_error(e))?;
        }
        Ok(output)
    }

    fn codec_error(&self, error: ImageError) -> EncodeError {
        EncodeError::Codec {
            format: self.kind.name(),
            message: error.to_string(),
        }
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Clamp quality to the searched range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
