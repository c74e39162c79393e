//! Suppression of events caused by our own writes.
//!
//! Replacing a file (temp file + rename) can surface as a fresh creation on
//! some platforms. Each replacement is remembered together with the length
//! and modification time of the file we left behind. An event is dropped only
//! while the file on disk still carries that stamp, so a new file created
//! under the same name is always processed.

use std::collections::HashMap;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Length and modification time identifying one version of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    /// File length in bytes
    pub len: u64,

    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Stamp from already-fetched metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }

    /// Current stamp of the file at `path`.
    pub async fn read(path: &Path) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(Self::from_metadata(&metadata))
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    stamp: FileStamp,
    written: Instant,
}

/// Files written by the pipeline, with the stamp they had after the write.
#[derive(Debug)]
pub struct RecentWrites {
    window: Duration,
    entries: HashMap<PathBuf, Entry>,
}

impl RecentWrites {
    /// Create an empty set that forgets writes after `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Remember that `path` was just written and now has `stamp`.
    pub fn record(&mut self, path: &Path, stamp: FileStamp) {
        self.record_at(path, stamp, Instant::now());
    }

    /// Whether the file at `path`, currently stamped `stamp`, is still the
    /// one we wrote within the window.
    ///
    /// A mismatching stamp means the file was replaced by someone else; its
    /// entry is forgotten. Expired entries are dropped as a side effect.
    pub fn is_own_write(&mut self, path: &Path, stamp: FileStamp) -> bool {
        self.is_own_write_at(path, stamp, Instant::now())
    }

    /// Number of remembered paths, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no paths are remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record_at(&mut self, path: &Path, stamp: FileStamp, now: Instant) {
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                stamp,
                written: now,
            },
        );
    }

    fn is_own_write_at(&mut self, path: &Path, stamp: FileStamp, now: Instant) -> bool {
        let window = self.window;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.written) < window);

        match self.entries.get(path) {
            Some(entry) if entry.stamp == stamp => true,
            Some(_) => {
                self.entries.remove(path);
                false
            }
            None => false,
        }
    }
}
