//! Configuration management for shrinkwatch.
//!
//! Settings come from two layers:
//! - An INI settings file (default `config.ini`) with a `[Settings]` section
//! - Command-line arguments via clap, with `SHRINKWATCH_` environment fallbacks
//!
//! Command-line values override the file. The file may be omitted only when
//! both the directory and the size limit are given on the command line.
//!
//! # Settings File
//!
//! ```ini
//! [Settings]
//! Directory = /srv/uploads
//! MaxSizeKB = 500
//! ```
//!
//! Keys are matched case-insensitively; the section name is not.
//!
//! # Environment Variables
//!
//! - `SHRINKWATCH_CONFIG` - Settings file path (default: config.ini)
//! - `SHRINKWATCH_DIRECTORY` - Watched directory (overrides `Directory`)
//! - `SHRINKWATCH_MAX_SIZE_KB` - Size limit in KB (overrides `MaxSizeKB`)
//! - `SHRINKWATCH_SETTLE_INTERVAL_MS` - File stability poll interval (default: 200)
//! - `SHRINKWATCH_SETTLE_TIMEOUT_MS` - Maximum wait for a file to settle (default: 10000)
//! - `SHRINKWATCH_QUEUE_CAPACITY` - Pending event queue size (default: 256)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ini::{Ini, ParseOption};

use crate::error::ConfigError;
use crate::shrink::SizeBudget;

// =============================================================================
// Default Values
// =============================================================================

/// Default settings file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";

/// Section holding the settings.
pub const SETTINGS_SECTION: &str = "Settings";

/// Key naming the watched directory.
pub const DIRECTORY_KEY: &str = "Directory";

/// Key holding the size limit in kilobytes.
pub const MAX_SIZE_KEY: &str = "MaxSizeKB";

/// Default interval between file stability checks.
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 200;

/// Default maximum time to wait for a new file to stop changing.
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 10_000;

/// Default capacity of the pending event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// shrinkwatch - keeps images in a directory under a size limit.
///
/// Watches a directory for new images and rewrites each one in place as
/// grayscale, lowering quality and then resolution until it fits.
#[derive(Parser, Debug, Clone)]
#[command(name = "shrinkwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Split into settings and the command to run (`watch` if none given).
    pub fn into_parts(self) -> (SettingsArgs, Command) {
        (self.settings, self.command.unwrap_or(Command::Watch))
    }
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Watch the directory and shrink new images (default)
    Watch,

    /// Shrink the given files once and exit
    Shrink(ShrinkArgs),

    /// Validate settings and exit
    Check,
}

/// Arguments for the `shrink` subcommand.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ShrinkArgs {
    /// Image files to process in place.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Settings shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Path to the INI settings file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH, env = "SHRINKWATCH_CONFIG")]
    pub config: PathBuf,

    /// Directory to watch (overrides `Directory` in the settings file).
    #[arg(short, long, global = true, env = "SHRINKWATCH_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Maximum file size in kilobytes (overrides `MaxSizeKB`).
    #[arg(short = 's', long, global = true, env = "SHRINKWATCH_MAX_SIZE_KB")]
    pub max_size_kb: Option<u64>,

    /// Interval between checks that a new file has stopped growing.
    #[arg(long, global = true, default_value_t = DEFAULT_SETTLE_INTERVAL_MS, env = "SHRINKWATCH_SETTLE_INTERVAL_MS")]
    pub settle_interval_ms: u64,

    /// Maximum time to wait for a new file to stop growing.
    #[arg(long, global = true, default_value_t = DEFAULT_SETTLE_TIMEOUT_MS, env = "SHRINKWATCH_SETTLE_TIMEOUT_MS")]
    pub settle_timeout_ms: u64,

    /// Maximum number of pending file events.
    #[arg(long, global = true, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "SHRINKWATCH_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl SettingsArgs {
    /// Resolve and validate the final settings.
    ///
    /// # Errors
    ///
    /// Any `ConfigError`; all of them are fatal at startup.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let file = self.settings_file(self.directory.is_none() || self.max_size_kb.is_none())?;

        let directory = match &self.directory {
            Some(dir) => dir.clone(),
            None => PathBuf::from(file_value(file.as_ref(), DIRECTORY_KEY)?),
        };

        let max_size_kb = self.resolve_max_size_kb(file.as_ref())?;

        let settings = Settings {
            directory,
            max_size_kb,
            budget: budget_from_kb(max_size_kb)?,
            settle_interval: Duration::from_millis(self.settle_interval_ms),
            settle_timeout: Duration::from_millis(self.settle_timeout_ms),
            queue_capacity: self.queue_capacity,
        };
        settings.validate()?;

        Ok(settings)
    }

    /// Resolve only the size limit.
    ///
    /// Used for one-shot processing of explicit files, where the watched
    /// directory plays no part and need not exist.
    pub fn load_budget(&self) -> Result<SizeBudget, ConfigError> {
        let file = self.settings_file(self.max_size_kb.is_none())?;
        budget_from_kb(self.resolve_max_size_kb(file.as_ref())?)
    }

    /// Read the settings file if present. A missing file is an error only
    /// when `required`.
    fn settings_file(&self, required: bool) -> Result<Option<Ini>, ConfigError> {
        if self.config.exists() {
            Ok(Some(read_settings_file(&self.config)?))
        } else if required {
            Err(ConfigError::MissingFile(self.config.clone()))
        } else {
            Ok(None)
        }
    }

    fn resolve_max_size_kb(&self, file: Option<&Ini>) -> Result<u64, ConfigError> {
        match self.max_size_kb {
            Some(kb) => Ok(kb),
            None => parse_max_size(&file_value(file, MAX_SIZE_KEY)?),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Validated runtime settings.
///
/// Built once at startup and passed by reference; never mutated.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Watched directory
    pub directory: PathBuf,

    /// Configured limit in kilobytes
    pub max_size_kb: u64,

    /// Limit in bytes (`max_size_kb * 1024`)
    pub budget: SizeBudget,

    /// Interval between file stability checks
    pub settle_interval: Duration,

    /// Maximum wait for a file to settle
    pub settle_timeout: Duration,

    /// Pending event queue capacity
    pub queue_capacity: usize,
}

impl Settings {
    /// Create settings with default tuning values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero or overflowing size.
    pub fn new(directory: impl Into<PathBuf>, max_size_kb: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            directory: directory.into(),
            max_size_kb,
            budget: budget_from_kb(max_size_kb)?,
            settle_interval: Duration::from_millis(DEFAULT_SETTLE_INTERVAL_MS),
            settle_timeout: Duration::from_millis(DEFAULT_SETTLE_TIMEOUT_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        })
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.directory.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.directory.clone()));
        }

        if self.settle_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "settle_interval_ms",
                message: "must be greater than 0".to_string(),
            });
        }

        if self.settle_timeout < self.settle_interval {
            return Err(ConfigError::InvalidValue {
                key: "settle_timeout_ms",
                message: "must not be shorter than the settle interval".to_string(),
            });
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_capacity",
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Settings File
// =============================================================================

/// Parse the settings file.
///
/// Backslashes are literal so Windows paths survive.
fn read_settings_file(path: &Path) -> Result<Ini, ConfigError> {
    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };

    Ini::load_from_file_opt(path, options).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Look up a key in the `[Settings]` section, ignoring key case.
fn file_value(file: Option<&Ini>, key: &'static str) -> Result<String, ConfigError> {
    let section = file
        .and_then(|ini| ini.section(Some(SETTINGS_SECTION)))
        .ok_or(ConfigError::MissingSection(SETTINGS_SECTION))?;

    section
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.trim().to_string())
        .ok_or(ConfigError::MissingKey {
            section: SETTINGS_SECTION,
            key,
        })
}

fn parse_max_size(value: &str) -> Result<u64, ConfigError> {
    let kb: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
        key: MAX_SIZE_KEY,
        message: format!("'{}' is not an integer", value),
    })?;

    u64::try_from(kb).map_err(|_| ConfigError::InvalidValue {
        key: MAX_SIZE_KEY,
        message: "must be positive".to_string(),
    })
}

fn budget_from_kb(kb: u64) -> Result<SizeBudget, ConfigError> {
    if kb == 0 {
        return Err(ConfigError::InvalidValue {
            key: MAX_SIZE_KEY,
            message: "must be positive".to_string(),
        });
    }

    SizeBudget::from_kb(kb).ok_or(ConfigError::InvalidValue {
        key: MAX_SIZE_KEY,
        message: format!("{} KB does not fit in a byte count", kb),
    })
}

// =============================================================================
// Tests
// =============================================================================
