//! Byte budget for processed files.

/// Bytes per configured kilobyte.
pub const BYTES_PER_KB: u64 = 1024;

/// Maximum encoded size for a processed file, in bytes.
///
/// Always positive. Built once at startup and copied into every processing
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeBudget(u64);

impl SizeBudget {
    /// Create a budget of `bytes` bytes.
    ///
    /// Returns `None` for a zero budget.
    pub const fn new(bytes: u64) -> Option<Self> {
        if bytes == 0 {
            None
        } else {
            Some(Self(bytes))
        }
    }

    /// Create a budget from a size in kilobytes (× 1024).
    ///
    /// Returns `None` for zero or if the byte count overflows.
    pub fn from_kb(kb: u64) -> Option<Self> {
        kb.checked_mul(BYTES_PER_KB).and_then(Self::new)
    }

    /// The budget in bytes.
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Whether an encoding of `size` bytes is within budget.
    #[inline]
    pub const fn fits(&self, size: u64) -> bool {
        size <= self.0
    }
}

impl std::fmt::Display for SizeBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}
