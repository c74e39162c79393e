//! Watch service: drains the event queue one file at a time.
//!
//! ```text
//! notify thread ──► mpsc queue ──► WatchService::run
//!                                    │
//!                                    ├─ drop if unchanged since our own write
//!                                    ├─ wait_until_stable
//!                                    ├─ ImageProcessor::process_file (blocking pool)
//!                                    └─ log outcome, continue
//! ```
//!
//! Exactly one file is in flight at any time. A shutdown request is only
//! observed between files, so a file that has started processing is always
//! completed (or fails) before the service returns.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::ProcessError;
use crate::format::is_supported_path;
use crate::watch::{wait_until_stable, FileStamp, RecentWrites, Settled};

use super::processor::{ImageProcessor, ProcessOutcome};

// =============================================================================
// Statistics
// =============================================================================

/// Counters for a service run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Files rewritten within budget
    pub replaced: usize,

    /// Files whose shrunk encoding matched their current bytes
    pub already_compliant: usize,

    /// Files left untouched because of an error
    pub failed: usize,

    /// Events dropped (unsupported name, vanished file, own write)
    pub ignored: usize,
}

// =============================================================================
// Watch Service
// =============================================================================

/// Sequential consumer of file events.
#[derive(Debug)]
pub struct WatchService {
    processor: ImageProcessor,
    settle_interval: Duration,
    settle_timeout: Duration,
    recent: RecentWrites,
    stats: ServiceStats,
}

impl WatchService {
    /// Create a service from validated settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            processor: ImageProcessor::new(settings.budget),
            settle_interval: settings.settle_interval,
            settle_timeout: settings.settle_timeout,
            recent: RecentWrites::new(settings.settle_timeout * 2),
            stats: ServiceStats::default(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Process events until the queue closes or `shutdown` resolves.
    ///
    /// Returns the final counters.
    pub async fn run<S>(mut self, mut events: mpsc::Receiver<PathBuf>, shutdown: S) -> ServiceStats
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(path) => {
                        self.handle(path).await;
                    }
                    None => {
                        debug!("event queue closed");
                        break;
                    }
                },
            }
        }

        self.stats
    }

    /// Handle one event to completion.
    ///
    /// Returns `None` when the event was ignored without processing.
    pub async fn handle(&mut self, path: PathBuf) -> Option<Result<ProcessOutcome, ProcessError>> {
        if !is_supported_path(&path) {
            self.stats.ignored += 1;
            return None;
        }

        if let Ok(stamp) = FileStamp::read(&path).await {
            if self.recent.is_own_write(&path, stamp) {
                debug!("{}: ignoring event for our own write", path.display());
                self.stats.ignored += 1;
                return None;
            }
        }

        info!("New file detected: {}", display_name(&path));

        match wait_until_stable(&path, self.settle_interval, self.settle_timeout).await {
            Ok(Settled::Stable { size }) => debug!("{}: stable at {} bytes", path.display(), size),
            Ok(Settled::TimedOut { size }) => warn!(
                "{}: still changing after {:?} ({} bytes), processing anyway",
                path.display(),
                self.settle_timeout,
                size
            ),
            Err(e) => {
                debug!("{}: skipped, {}", path.display(), e);
                self.stats.ignored += 1;
                return None;
            }
        }

        let processor = self.processor;
        let job_path = path.clone();
        let result = tokio::task::spawn_blocking(move || processor.process_file(&job_path))
            .await
            .unwrap_or_else(|e| Err(ProcessError::Task(e.to_string())));

        if let Ok(ProcessOutcome::Replaced(_)) = &result {
            match FileStamp::read(&path).await {
                Ok(stamp) => self.recent.record(&path, stamp),
                Err(e) => debug!("{}: cannot stamp replaced file: {}", path.display(), e),
            }
        }

        self.record(&path, &result);
        Some(result)
    }

    fn record(&mut self, path: &Path, result: &Result<ProcessOutcome, ProcessError>) {
        let name = display_name(path);

        match result {
            Ok(ProcessOutcome::Replaced(replacement)) => {
                self.stats.replaced += 1;
                info!("{}: {}", name, replacement.summary());
            }
            Ok(ProcessOutcome::AlreadyCompliant { size }) => {
                self.stats.already_compliant += 1;
                info!(
                    "{}: already in its shrunk form ({:.2} KB), left as is",
                    name,
                    *size as f64 / 1024.0
                );
            }
            Err(e) if e.is_expected() => {
                self.stats.failed += 1;
                warn!("{}: {}; file left unchanged", name, e);
            }
            Err(e) => {
                self.stats.failed += 1;
                error!("{}: unexpected error: {}; file left unchanged", name, e);
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Tests
// =============================================================================
