use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating settings.
///
/// All of these are fatal at startup: the watch loop never starts with an
/// invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file does not exist
    #[error("Configuration file '{0}' not found")]
    MissingFile(PathBuf),

    /// Settings file exists but could not be read or parsed
    #[error("Failed to read configuration file '{path}': {message}")]
    Unreadable { path: PathBuf, message: String },

    /// Required section is absent from the settings file
    #[error("Missing section [{0}] in configuration file")]
    MissingSection(&'static str),

    /// Required key is absent from its section
    #[error("Missing key '{key}' in section [{section}]")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    /// Key is present but its value cannot be used
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },

    /// Watched directory does not exist or is not a directory
    #[error("Directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),
}

/// Errors starting the directory watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Platform watcher could not be created or attached
    #[error("Failed to watch '{path}': {message}")]
    Init { path: PathBuf, message: String },
}

/// Errors from the image codecs while producing a candidate encoding.
///
/// The size-constrained search never fails because an image is too large;
/// that is reported as an unsatisfiable outcome. These errors only cover
/// encoder failures.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// Codec rejected the pixel data
    #[error("{format} encoding failed: {message}")]
    Codec {
        format: &'static str,
        message: String,
    },
}

/// Per-file processing failures.
///
/// None of these stop the watch loop; the original file is left untouched.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// File is not an image, is truncated, or is in a format we cannot write
    #[error("Not a valid image or corrupted: {message}")]
    Decode { message: String },

    /// No quality and resolution fits the budget above the minimum dimension
    #[error(
        "Cannot fit {budget} bytes: gave up at {width}x{height} after {levels} resolution level(s)"
    )]
    Unsatisfiable {
        budget: u64,
        width: u32,
        height: u32,
        levels: u32,
    },

    /// Codec failure while searching
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Filesystem failure while reading or replacing the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background task panicked or was cancelled
    #[error("Processing task failed: {0}")]
    Task(String),
}

impl ProcessError {
    /// Whether this error is one of the anticipated per-file outcomes
    /// (bad input or unreachable budget) rather than an unexpected failure.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ProcessError::Decode { .. } | ProcessError::Unsatisfiable { .. }
        )
    }
}
