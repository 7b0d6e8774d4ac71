//! Source-bundle fetching.
//!
//! The network transport is a collaborator of the pipeline, not part of it:
//! the pipeline depends on the [`SourceFetcher`] trait and the
//! [`HttpFetcher`] implements it against the arXiv e-print endpoint.
//!
//! # Example
//!
//! ```no_run
//! use arxiv_latex_core::download::{HttpFetcher, SourceFetcher};
//! use arxiv_latex_core::parser::parse_reference;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::with_options("https://arxiv.org", 30, 300)?;
//! let bytes = fetcher.fetch(&parse_reference("2301.01234")?).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::{HttpFetcher, SourceFetcher};
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, EPRINT_SEGMENT, READ_TIMEOUT_SECS};
pub use error::FetchError;

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
