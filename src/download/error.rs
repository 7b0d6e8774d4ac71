//! Error types for the download module.
//!
//! Every variant is a fetch failure from the pipeline's point of view; the
//! variants only differ in the context they carry for the user.

use thiserror::Error;

/// Errors that can occur while fetching a source bundle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}\n  Suggestion: {suggestion}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// User-facing hint derived from the status.
        suggestion: &'static str,
    },

    /// The endpoint URL could not be built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The server answered 200 with an empty body.
    #[error("empty response body fetching {url}")]
    EmptyBody {
        /// The URL that returned no bytes.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error with a status-specific suggestion.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let suggestion = match status {
            404 => "Check the identifier; the paper may have no source bundle",
            403 | 429 => "The endpoint is throttling requests; wait before retrying",
            500..=599 => "The endpoint is having trouble; retry later",
            _ => "Check the identifier and endpoint URL",
        };
        Self::HttpStatus {
            url: url.into(),
            status,
            suggestion,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an empty-body error.
    pub fn empty_body(url: impl Into<String>) -> Self {
        Self::EmptyBody { url: url.into() }
    }

    /// Creates a client-construction error.
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://arxiv.org/e-print/2301.01234");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "{msg}");
        assert!(msg.contains("https://arxiv.org/e-print/2301.01234"), "{msg}");
    }

    #[test]
    fn test_fetch_error_http_status_404_suggestion() {
        let msg = FetchError::http_status("https://arxiv.org/e-print/1", 404).to_string();
        assert!(msg.contains("HTTP 404"), "{msg}");
        assert!(msg.contains("no source bundle"), "{msg}");
    }

    #[test]
    fn test_fetch_error_http_status_server_error_suggestion() {
        let msg = FetchError::http_status("https://arxiv.org/e-print/1", 503).to_string();
        assert!(msg.contains("retry later"), "{msg}");
    }

    #[test]
    fn test_fetch_error_invalid_url_display() {
        let msg = FetchError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"), "{msg}");
        assert!(msg.contains("not-a-url"), "{msg}");
    }
}
