//! Directory watcher.
//!
//! Wraps a platform `notify` watcher on a single directory (non-recursive)
//! and forwards the paths of newly created image files into a bounded queue.
//! The queue has exactly one consumer, so paths are handled one at a time in
//! the order they were reported.

use std::path::{Path, PathBuf};

use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::WatchError;
use crate::format::is_supported_path;

/// Handle keeping the platform watcher alive.
///
/// Dropping it stops event delivery and closes the queue once the pending
/// paths have been drained.
pub struct DirectoryWatcher {
    directory: PathBuf,
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Start watching `directory`.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory to observe (not its subdirectories)
    /// * `capacity` - Maximum number of queued paths; the notifier thread
    ///   blocks while the queue is full
    ///
    /// # Returns
    ///
    /// The watcher handle and the receiving end of the path queue.
    pub fn start(
        directory: &Path,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<PathBuf>), WatchError> {
        let (tx, rx) = mpsc::channel(capacity);

        let init_error = |e: notify::Error| WatchError::Init {
            path: directory.to_path_buf(),
            message: e.to_string(),
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in created_images(&event) {
                    debug!("queued {}", path.display());
                    if tx.blocking_send(path).is_err() {
                        // Consumer is gone; nothing left to do.
                        return;
                    }
                }
            }
            Err(e) => warn!("watch error: {}", e),
        })
        .map_err(init_error)?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(init_error)?;

        Ok((
            Self {
                directory: directory.to_path_buf(),
                _watcher: watcher,
            },
            rx,
        ))
    }

    /// The watched directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Paths of supported image files created by `event`.
///
/// Directory creations, modifications, renames and removals are ignored.
pub fn created_images(event: &Event) -> Vec<PathBuf> {
    let is_file_creation = matches!(
        event.kind,
        EventKind::Create(CreateKind::File | CreateKind::Any | CreateKind::Other)
    );
    if !is_file_creation {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| is_supported_path(path))
        .cloned()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
