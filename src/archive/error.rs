//! Error types for archive extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while unpacking a source bundle.
///
/// All variants are fatal for the resolution run; a corrupt archive needs a
/// fresh fetch (`--refresh`) to recover.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The archive file could not be opened.
    #[error("cannot open archive {path}: {source}")]
    Unreadable {
        /// The archive path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The archive stream is not a valid (gzipped) tar.
    #[error("corrupt archive {path}: {source}\n  Suggestion: Re-fetch the source with --refresh")]
    Corrupt {
        /// The archive path.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: std::io::Error,
    },

    /// An entry would be written outside the destination directory.
    #[error("archive entry '{entry}' escapes the destination directory")]
    UnsafeEntry {
        /// The offending entry path as stored in the archive.
        entry: PathBuf,
    },

    /// File system error while writing the extracted tree.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Creates an unreadable-archive error.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt-archive error.
    pub fn corrupt(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsafe-entry error.
    pub fn unsafe_entry(entry: impl Into<PathBuf>) -> Self {
        Self::UnsafeEntry {
            entry: entry.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
