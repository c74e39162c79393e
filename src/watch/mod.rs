//! File event source.
//!
//! This module turns filesystem notifications into a queue of image paths
//! ready for processing.
//!
//! # Components
//!
//! - [`DirectoryWatcher`]: `notify` watcher feeding a bounded single-consumer queue
//! - [`wait_until_stable`]: polls a new file until the writer has finished
//! - [`RecentWrites`]: remembers files we replaced, by [`FileStamp`], so their events are ignored

mod recent;
mod settle;
mod watcher;

pub use recent::{FileStamp, RecentWrites};
pub use settle::{wait_until_stable, Settled};
pub use watcher::{created_images, DirectoryWatcher};
