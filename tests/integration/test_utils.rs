//! Test utilities for integration tests.
//!
//! Deterministic image generators and helpers for writing test files.

use std::path::Path;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma, Rgb, RgbImage};
use tempfile::TempDir;

use shrinkwatch::config::Settings;
use shrinkwatch::shrink::next_dimensions;

// =============================================================================
// Image Generators
// =============================================================================

/// Xorshift generator seeded from `seed` (never zero).
pub struct Noise(u32);

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self(seed | 1)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 >> 24) as u8
    }
}

/// Gradient with moderate noise: photo-like, compresses to a realistic size.
pub fn textured_gray(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut noise = Noise::new(seed);
    GrayImage::from_fn(width, height, |x, y| {
        let base = (x * 255 / width.max(1) + y * 255 / height.max(1)) / 2;
        let jitter = (noise.next_u8() & 0x3F) as u32;
        Luma([(base + jitter).min(255) as u8])
    })
}

/// Color counterpart of [`textured_gray`].
pub fn textured_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut noise = Noise::new(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = noise.next_u8();
        Rgb([r ^ (b & 0x1F), g, b])
    })
}

/// Encode an RGB image as JPEG at `quality`.
pub fn rgb_jpeg(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(img)
        .unwrap();
    buf
}

/// Check if data starts with JPEG SOI marker.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

// =============================================================================
// Dimensions
// =============================================================================

/// All dimensions the fallback visits from `(width, height)`, excluding the start.
pub fn fallback_chain(width: u32, height: u32) -> Vec<(u32, u32)> {
    let mut chain = Vec::new();
    let mut current = (width, height);
    while let Some(next) = next_dimensions(current.0, current.1) {
        chain.push(next);
        current = next;
    }
    chain
}

// =============================================================================
// Settings
// =============================================================================

/// Settings for `dir` with short settle timings.
pub fn fast_settings(dir: &TempDir, max_size_kb: u64) -> Settings {
    let mut settings = Settings::new(dir.path(), max_size_kb).unwrap();
    settings.settle_interval = Duration::from_millis(20);
    settings.settle_timeout = Duration::from_secs(2);
    settings
}

/// Read a file's size.
pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}
