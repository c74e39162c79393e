//! # shrinkwatch
//!
//! Keeps the images in a directory under a size limit.
//!
//! A watcher picks up newly created PNG, JPEG, BMP and GIF files and rewrites
//! each one in place as grayscale, with the highest quality and resolution
//! that fits a configured byte budget.
//!
//! ## Features
//!
//! - **Grayscale normalization**: every processed image is stored single-channel
//! - **Quality search**: binary search over JPEG quality 1-95, at most 7 encodes
//! - **Resolution fallback**: ×0.9 Lanczos downscaling until the budget is met,
//!   down to 10 pixels per side
//! - **Safe replacement**: results are written to a temp file and renamed over
//!   the original; failures leave the original untouched
//!
//! ## Architecture
//!
//! - [`shrink`] - Size-constrained encoder (the core algorithm)
//! - [`mod@format`] - Extension filter and content-based format detection
//! - [`watch`] - Directory watcher, file settling, own-write suppression
//! - [`pipeline`] - Per-file processing and the sequential watch service
//! - [`config`] - CLI and settings file
//!
//! ## Example
//!
//! ```rust
//! use image::{DynamicImage, GrayImage, Luma};
//! use shrinkwatch::{FitOutcome, ImageKind, SizeBudget, SizeConstrainedEncoder};
//!
//! let img = DynamicImage::ImageLuma8(GrayImage::from_fn(200, 150, |x, y| {
//!     Luma([((x * y) % 256) as u8])
//! }));
//!
//! let encoder = SizeConstrainedEncoder::new(SizeBudget::from_kb(4).unwrap());
//! match encoder.fit(img, ImageKind::Jpeg).unwrap() {
//!     FitOutcome::Fitted(fitted) => {
//!         assert!(fitted.size() <= 4 * 1024);
//!         println!("{}x{} at {:?}", fitted.width, fitted.height, fitted.quality);
//!     }
//!     FitOutcome::Unsatisfiable { .. } => println!("does not fit"),
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod shrink;
pub mod watch;

// Re-export commonly used types
pub use config::{Cli, Command, Settings, SettingsArgs, ShrinkArgs};
pub use error::{ConfigError, EncodeError, ProcessError, WatchError};
pub use format::{detect_kind, is_supported_path, ImageKind};
pub use pipeline::{ImageProcessor, ProcessOutcome, Replacement, ServiceStats, WatchService};
pub use shrink::{
    search_quality, EncodingAttempt, FitOutcome, FitStrategy, Fitted, GrayCodec, SizeBudget,
    SizeConstrainedEncoder, MAX_QUALITY, MIN_DIMENSION, MIN_QUALITY,
};
pub use watch::{wait_until_stable, DirectoryWatcher, FileStamp, RecentWrites, Settled};
