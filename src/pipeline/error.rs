//! Pipeline-level error type and failure classification.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ExtractError;
use crate::cache::CacheError;
use crate::detect::DetectError;
use crate::download::FetchError;
use crate::parser::ParseError;

/// Coarse failure category, stable across error-message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    /// The reference names no arXiv paper.
    InvalidReference,
    /// Network or HTTP status failure.
    Fetch,
    /// The archive could not be unpacked.
    Extraction,
    /// The source tree holds no `.tex` file.
    NoEntryPoint,
    /// Local cache I/O failed.
    Cache,
    /// Anything else (configuration, working directory, task failure).
    Other,
}

impl FailureKind {
    /// Process exit code for this kind.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Other | Self::Cache => 1,
            Self::InvalidReference => 2,
            Self::Fetch => 3,
            Self::Extraction => 4,
            Self::NoEntryPoint => 5,
        }
    }

    /// Stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidReference => "invalid-reference",
            Self::Fetch => "fetch",
            Self::Extraction => "extraction",
            Self::NoEntryPoint => "no-entry-point",
            Self::Cache => "cache",
            Self::Other => "other",
        }
    }
}

/// Errors that abort one resolution.
///
/// Inlining problems never appear here: they are annotated in the combined
/// text instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unparsable reference.
    #[error(transparent)]
    InvalidReference(#[from] ParseError),

    /// Source bundle could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Source bundle could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// No entry point in the unpacked tree.
    #[error(transparent)]
    NoEntryPoint(#[from] DetectError),

    /// Cache read/write failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Rejected configuration value.
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The working directory could not be prepared.
    #[error("cannot prepare working directory {path}: {source}")]
    Workspace {
        /// The directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A blocking stage panicked or was cancelled.
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Creates a configuration error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a working-directory error.
    pub fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }

    /// Failure category of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidReference(_) => FailureKind::InvalidReference,
            Self::Fetch(_) => FailureKind::Fetch,
            Self::Extraction(_) => FailureKind::Extraction,
            Self::NoEntryPoint(_) => FailureKind::NoEntryPoint,
            Self::Cache(_) => FailureKind::Cache,
            Self::InvalidConfig { .. } | Self::Workspace { .. } | Self::Task(_) => {
                FailureKind::Other
            }
        }
    }
}
