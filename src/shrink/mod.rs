//! Size-constrained re-encoding.
//!
//! This module turns a decoded image into the best grayscale encoding of the
//! same format that fits a byte budget.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         SizeConstrainedEncoder          │
//! │  (grayscale, fast path, fallback loop)  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            search_quality               │
//! │   (binary search over 1..=95 quality)   │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              GrayCodec                  │
//! │    (JPEG / PNG / BMP / GIF encoders)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`SizeConstrainedEncoder`]: entry point, returns a [`FitOutcome`]
//! - [`search_quality`]: finds the highest fitting quality with at most 7 encodes
//! - [`GrayCodec`]: encodes grayscale rasters at default settings or a given quality
//! - [`SizeBudget`]: positive byte limit

mod budget;
mod codec;
mod fit;
mod search;

pub use budget::{SizeBudget, BYTES_PER_KB};
pub use codec::{clamp_quality, GrayCodec, DEFAULT_JPEG_QUALITY, MAX_QUALITY, MIN_QUALITY};
pub use fit::{
    next_dimensions, to_grayscale, FitOutcome, FitStrategy, Fitted, SizeConstrainedEncoder,
    DOWNSCALE_FACTOR, MIN_DIMENSION,
};
pub use search::{search_quality, EncodingAttempt};
