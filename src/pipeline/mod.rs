//! Processing pipeline.
//!
//! - [`ImageProcessor`]: shrinks a single file in place (synchronous)
//! - [`WatchService`]: drains the event queue, settling and processing one file at a time
//! - [`replace_file`]: atomic temp-file-and-rename replacement

mod processor;
mod service;

pub use processor::{replace_file, ImageProcessor, ProcessOutcome, Replacement, TEMP_FILE_PREFIX};
pub use service::{ServiceStats, WatchService};
