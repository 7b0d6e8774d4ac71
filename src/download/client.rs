//! HTTP fetcher for arXiv source bundles.
//!
//! [`HttpFetcher`] issues `GET {base}/e-print/{id}` and returns the body
//! bytes. Any non-200 status or transport error is a [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, EPRINT_SEGMENT, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::parser::ArxivId;
use crate::user_agent;

/// Retrieves the raw archive bytes for an identifier.
///
/// The pipeline only depends on this trait; the HTTP transport is one
/// implementation and tests substitute in-memory doubles.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches the source bundle for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on any transport or status failure.
    async fn fetch(&self, id: &ArxivId) -> Result<Vec<u8>, FetchError>;
}

/// HTTP implementation of [`SourceFetcher`] against the e-print endpoint.
///
/// Create once and reuse; the inner client pools connections.
///
/// # Example
///
/// ```no_run
/// use arxiv_latex_core::download::{HttpFetcher, SourceFetcher};
/// use arxiv_latex_core::parser::parse_reference;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new()?;
/// let id = parse_reference("https://arxiv.org/abs/1706.03762")?;
/// let bytes = fetcher.fetch(&id).await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    /// Creates a fetcher for the public arXiv endpoint with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(DEFAULT_BASE_URL, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a fetcher with an explicit endpoint base and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for an unparsable base and
    /// [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_options(
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_fetch_user_agent())
            .build()
            .map_err(FetchError::client_build)?;
        Ok(Self { client, base_url })
    }

    /// Endpoint URL for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the joined URL is invalid.
    pub fn eprint_url(&self, id: &ArxivId) -> Result<Url, FetchError> {
        let joined = format!("{EPRINT_SEGMENT}/{}", id.as_str());
        self.base_url
            .join(&joined)
            .map_err(|_| FetchError::invalid_url(format!("{}{joined}", self.base_url)))
    }

    async fn send_request(&self, url: &Url) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url.as_str())
            } else {
                FetchError::network(url.as_str(), e)
            }
        })?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    #[instrument(skip(self), fields(id = %id))]
    async fn fetch(&self, id: &ArxivId) -> Result<Vec<u8>, FetchError> {
        let url = self.eprint_url(id)?;
        debug!(url = %url, "requesting source bundle");

        let response = self.send_request(&url).await?;
        let body = collect_body(response, url.as_str()).await?;
        if body.is_empty() {
            return Err(FetchError::empty_body(url.as_str()));
        }

        info!(url = %url, bytes = body.len(), "source bundle fetched");
        Ok(body)
    }
}

/// Ensures the base ends with `/` so `join` appends instead of replacing the
/// last path segment.
fn parse_base_url(base: &str) -> Result<Url, FetchError> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let url = Url::parse(&normalized).map_err(|_| FetchError::invalid_url(base))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::invalid_url(base));
    }
    Ok(url)
}

async fn collect_body(response: reqwest::Response, url: &str) -> Result<Vec<u8>, FetchError> {
    let capacity = response
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0);
    let mut body = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, ResponseTemplate};

    use crate::parser::parse_reference;
    use crate::test_support::socket_guard::start_mock_server_or_skip;

    fn id(raw: &str) -> ArxivId {
        parse_reference(raw).unwrap()
    }

    #[test]
    fn test_eprint_url_for_modern_and_legacy_ids() {
        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(
            fetcher.eprint_url(&id("2301.01234")).unwrap().as_str(),
            "https://arxiv.org/e-print/2301.01234"
        );
        assert_eq!(
            fetcher.eprint_url(&id("hep-th/9901001")).unwrap().as_str(),
            "https://arxiv.org/e-print/hep-th/9901001"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix_is_preserved() {
        let fetcher = HttpFetcher::with_options("http://mirror.local/arxiv", 1, 1).unwrap();
        assert_eq!(
            fetcher.eprint_url(&id("2301.01234")).unwrap().as_str(),
            "http://mirror.local/arxiv/e-print/2301.01234"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpFetcher::with_options("ftp://arxiv.org", 1, 1),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpFetcher::with_options("not a url", 1, 1),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body_and_sends_user_agent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/e-print/2301.01234"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tarball".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_options(&mock_server.uri(), 5, 5).unwrap();
        let bytes = fetcher.fetch(&id("2301.01234")).await.unwrap();
        assert_eq!(bytes, b"tarball");
    }

    #[tokio::test]
    async fn test_fetch_404_is_http_status_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/e-print/2301.01234"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_options(&mock_server.uri(), 5, 5).unwrap();
        match fetcher.fetch(&id("2301.01234")).await {
            Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_non_200_success_status_is_rejected() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/e-print/2301.01234"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_options(&mock_server.uri(), 5, 5).unwrap();
        assert!(matches!(
            fetcher.fetch(&id("2301.01234")).await,
            Err(FetchError::HttpStatus { status: 204, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_empty_body_is_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/e-print/2301.01234"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_options(&mock_server.uri(), 5, 5).unwrap();
        assert!(matches!(
            fetcher.fetch(&id("2301.01234")).await,
            Err(FetchError::EmptyBody { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_read_timeout_maps_to_timeout() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/e-print/2301.01234"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_options(&mock_server.uri(), 1, 1).unwrap();
        assert!(matches!(
            fetcher.fetch(&id("2301.01234")).await,
            Err(FetchError::Timeout { .. })
        ));
    }
}
