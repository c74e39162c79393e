//! Image format handling.
//!
//! Identifies which files the watcher should pick up and which codec to use
//! when writing them back.
//!
//! # Format Detection
//!
//! Use [`detect::is_supported_path`] to filter watcher events by extension and
//! [`detect::detect_kind`] to identify the encoded format from content.
//! Supported formats:
//!
//! - **JPEG**: the only format with a quality parameter
//! - **PNG**, **BMP**, **GIF**: lossless; shrunk by downscaling only

pub mod detect;

pub use detect::{detect_kind, is_supported_path, ImageKind, SUPPORTED_EXTENSIONS};
