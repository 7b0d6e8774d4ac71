//! Error types for reference parsing.

use thiserror::Error;

/// Maximum reference length to accept.
/// Longer inputs are rejected before any pattern matching runs.
pub const MAX_REFERENCE_LENGTH: usize = 2000;

/// Errors that can occur while turning a reference string into an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input does not contain a recognizable arXiv identifier.
    #[error("invalid reference '{input}': {reason}\n  Suggestion: {suggestion}")]
    InvalidReference {
        /// The input that failed to parse (truncated for display).
        input: String,
        /// Why the input was rejected.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },
}

impl ParseError {
    /// Creates an `InvalidReference` error for input with no identifier match.
    #[must_use]
    pub fn no_identifier(input: &str) -> Self {
        Self::InvalidReference {
            input: preview(input),
            reason: "no arXiv identifier found".to_string(),
            suggestion: "Use a URL like https://arxiv.org/abs/2301.01234 or a bare identifier"
                .to_string(),
        }
    }

    /// Creates an `InvalidReference` error for empty input.
    #[must_use]
    pub fn empty() -> Self {
        Self::InvalidReference {
            input: String::new(),
            reason: "reference is empty".to_string(),
            suggestion: "Pass an arXiv URL or identifier".to_string(),
        }
    }

    /// Creates an `InvalidReference` error for oversized input.
    #[must_use]
    pub fn too_long(input: &str) -> Self {
        Self::InvalidReference {
            input: preview(input),
            reason: format!(
                "reference is {} chars, max {MAX_REFERENCE_LENGTH}",
                input.len()
            ),
            suggestion: "Pass a single URL or identifier, not a document".to_string(),
        }
    }
}

fn preview(input: &str) -> String {
    input.chars().take(80).collect()
}
