//! Application-wide error types.
//!
//! Library modules return [`Error`] via `thiserror`, while the CLI layer
//! uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum shared by every pipeline stage
//! - Stage-specific errors (e.g. [`ChecksumError`]) wrapped with the file path
//! - Per-file variants are logged and swallowed by the extractor; only
//!   [`Error::Output`] and [`Error::Config`] reach the CLI
//!
//! # Example
//!
//! ```ignore
//! use music_inventory::error::{Error, Result};
//!
//! fn digest(path: &Path) -> Result<String> {
//!     let file = File::open(path)?; // IO errors auto-convert
//!     Ok(hash_reader(file)?)
//! }
//! ```

use std::path::PathBuf;

use crate::hash::audio::ChecksumError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failed; aborts the walk of that root only
    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Tag reading error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Audio-only checksum error
    #[error("Checksum error for {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: ChecksumError,
    },

    /// Output table could not be created or written
    #[error("Output error for {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a checksum error.
    pub fn checksum(path: impl Into<PathBuf>, source: ChecksumError) -> Self {
        Self::Checksum {
            path: path.into(),
            source,
        }
    }

    /// Create an output error.
    pub fn output(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to IO results.
pub trait ResultExt<T> {
    /// Wrap the error as [`Error::Io`] with context.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::metadata("/path/to/file.mp3", "no tags");
        assert!(err.to_string().contains("/path/to/file.mp3"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::metadata("/music/a.mp3", "no tags").context("while reading tags");
        let msg = err.to_string();
        assert!(msg.contains("while reading tags"));
    }

    #[test]
    fn test_checksum_error_names_path() {
        let err = Error::checksum("/music/song.m4a", ChecksumError::Truncated("mdat"));
        let msg = err.to_string();
        assert!(msg.contains("song.m4a"));
        assert!(msg.contains("mdat"));
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk gone"));
        let with_ctx = result.with_context("opening /music/a.mp3");
        let msg = with_ctx.unwrap_err().to_string();
        assert!(msg.contains("opening /music/a.mp3"));
        assert!(msg.contains("disk gone"));
    }
}
