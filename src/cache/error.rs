//! Error types for the archive cache.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or populating the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// File system error on a cache path.
    #[error("cache IO error at {path}: {source}\n  Suggestion: Check permissions on the cache directory or pass --cache-dir")]
    Io {
        /// The cache path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Creates an IO error with the failing path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
