//! Reference parsing: turns a URL or bare identifier into an [`ArxivId`].
//!
//! # Accepted forms
//!
//! - `https://arxiv.org/abs/2301.01234` and `https://arxiv.org/pdf/2301.01234.pdf`
//! - legacy identifiers such as `https://arxiv.org/abs/hep-th/9901001`
//! - bare identifiers (`2301.01234`, `math.GT/0309136`, `arXiv:2301.01234`)
//!
//! Version suffixes (`v2`) are not part of the identifier; the e-print
//! endpoint serves the latest version for an unversioned identifier.
//!
//! # Example
//!
//! ```
//! use arxiv_latex_core::parser::parse_reference;
//!
//! let id = parse_reference("https://arxiv.org/abs/hep-th/9901001").unwrap();
//! assert_eq!(id.as_str(), "hep-th/9901001");
//! assert_eq!(id.storage_key(), "hep-th_9901001");
//! ```

mod error;

pub use error::{MAX_REFERENCE_LENGTH, ParseError};

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::utils::compile_static_regex;

/// Legacy `archive[.XX]/ddddddd` or modern `digits.digits`.
const ID_PATTERN: &str = r"[a-z\-]+(?:\.[A-Za-z]{2})?/\d{7}|\d+\.\d+";

static URL_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(&format!(
        r"(?i:arxiv\.org)/(?:abs|pdf)/(?P<id>{ID_PATTERN})"
    ))
});

static BARE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(&format!(r"^(?i:arxiv:)?\s*(?P<id>{ID_PATTERN})(?:v\d+)?$"))
});

/// Canonical identifier of one arXiv paper's source bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArxivId(String);

impl ArxivId {
    /// Returns the identifier as it appears in arXiv URLs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a filesystem-safe key (path separators replaced by `_`).
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.0.replace(['/', '\\'], "_")
    }

    /// True for pre-2007 `archive/ddddddd` identifiers.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.0.contains('/')
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArxivId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_reference(s)
    }
}

impl AsRef<str> for ArxivId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts the arXiv identifier from a reference string.
///
/// URL references are searched for an `abs/` or `pdf/` path segment on an
/// `arxiv.org` host; otherwise the whole trimmed input must be an identifier.
///
/// # Errors
///
/// Returns [`ParseError::InvalidReference`] when no identifier is found.
pub fn parse_reference(input: &str) -> Result<ArxivId, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::empty());
    }
    if trimmed.len() > MAX_REFERENCE_LENGTH {
        return Err(ParseError::too_long(trimmed));
    }

    let captured = URL_ID_RE
        .captures(trimmed)
        .or_else(|| BARE_ID_RE.captures(trimmed))
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string());

    match captured {
        Some(id) => {
            debug!(input = %trimmed, id = %id, "parsed arXiv identifier");
            Ok(ArxivId(id))
        }
        None => Err(ParseError::no_identifier(trimmed)),
    }
}
