//! Binary search over the quality parameter.
//!
//! The search assumes encoded size is non-decreasing in quality for a fixed
//! image. Under that assumption it returns the highest quality in
//! `MIN_QUALITY..=MAX_QUALITY` whose output fits the budget, using at most
//! `ceil(log2(95)) = 7` encodes.
//!
//! Even when the codec is not perfectly monotonic, a returned quality `q`
//! always satisfies: `q` fits, and `q + 1` was tried and did not fit (or
//! `q == MAX_QUALITY`).

use tracing::debug;

use crate::error::EncodeError;

use super::budget::SizeBudget;
use super::codec::{MAX_QUALITY, MIN_QUALITY};

// =============================================================================
// Encoding Attempt
// =============================================================================

/// One candidate encoding produced during a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingAttempt {
    /// Quality the bytes were encoded at
    pub quality: u8,

    /// Encoded output
    pub bytes: Vec<u8>,
}

impl EncodingAttempt {
    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// =============================================================================
// Quality Search
// =============================================================================

/// Find the highest quality whose encoding fits the budget.
///
/// # Arguments
///
/// * `budget` - Maximum encoded size
/// * `encode` - Produces the encoding at a given quality
///
/// # Returns
///
/// `Ok(Some(attempt))` with the best fitting attempt, or `Ok(None)` if even
/// quality 1 is too large.
///
/// # Errors
///
/// Propagates the first error returned by `encode`.
pub fn search_quality<F>(
    budget: SizeBudget,
    mut encode: F,
) -> Result<Option<EncodingAttempt>, EncodeError>
where
    F: FnMut(u8) -> Result<Vec<u8>, EncodeError>,
{
    let mut low = MIN_QUALITY;
    let mut high = MAX_QUALITY;
    let mut best: Option<EncodingAttempt> = None;

    while low <= high {
        let mid = low + (high - low) / 2;
        let bytes = encode(mid)?;
        let size = bytes.len() as u64;

        if budget.fits(size) {
            debug!("quality {}: {} bytes, fits", mid, size);
            best = Some(EncodingAttempt { quality: mid, bytes });
            low = mid + 1;
        } else {
            debug!("quality {}: {} bytes, over budget", mid, size);
            if mid == MIN_QUALITY {
                break;
            }
            high = mid - 1;
        }
    }

    Ok(best)
}

// =============================================================================
// Tests
// =============================================================================
