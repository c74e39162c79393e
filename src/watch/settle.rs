//! Waiting for newly created files to finish being written.
//!
//! A create notification usually arrives while the writer is still filling
//! the file. Instead of sleeping for a fixed time, the file's length and
//! modification time are polled until two consecutive readings agree.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use super::recent::FileStamp;

/// How a settle wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Two consecutive readings matched and the file is non-empty
    Stable { size: u64 },

    /// The timeout elapsed while the file was still changing or empty
    TimedOut { size: u64 },
}

impl Settled {
    /// Last observed size.
    pub fn size(&self) -> u64 {
        match self {
            Settled::Stable { size } | Settled::TimedOut { size } => *size,
        }
    }
}

async fn snapshot(path: &Path) -> io::Result<FileStamp> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    Ok(FileStamp::from_metadata(&metadata))
}

/// Wait until `path` stops changing.
///
/// # Arguments
///
/// * `path` - File to observe
/// * `interval` - Delay between readings
/// * `timeout` - Upper bound on the total wait
///
/// # Errors
///
/// Returns an I/O error if the file disappears or is not a regular file.
/// Reaching the timeout is not an error; the caller decides what to do with
/// a file that never settled.
pub async fn wait_until_stable(
    path: &Path,
    interval: Duration,
    timeout: Duration,
) -> io::Result<Settled> {
    let deadline = Instant::now() + timeout;
    let mut previous = snapshot(path).await?;

    loop {
        if Instant::now() >= deadline {
            return Ok(Settled::TimedOut { size: previous.len });
        }

        tokio::time::sleep(interval).await;
        let current = snapshot(path).await?;

        if current == previous && current.len > 0 {
            return Ok(Settled::Stable { size: current.len });
        }
        previous = current;
    }
}

// =============================================================================
// Tests
// =============================================================================
