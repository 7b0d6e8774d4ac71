//! arXiv LaTeX Core Library
//!
//! Turns a reference to an arXiv paper into the paper's complete LaTeX
//! source as one self-contained document: the source bundle is fetched (or
//! read from a local cache), unpacked, its root document located, and every
//! `\input`/`\include` directive replaced with the included file's text.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Reference → canonical arXiv identifier
//! - [`cache`] - Persistent per-identifier archive store
//! - [`download`] - E-print endpoint client behind the [`SourceFetcher`] trait
//! - [`archive`] - Hardened tar/gzip extraction
//! - [`detect`] - Entry-point heuristics
//! - [`inline`] - Bounded, cycle-safe include expansion
//! - [`pipeline`] - Stage orchestration, configuration, progress events

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod cache;
pub mod detect;
pub mod download;
pub mod inline;
pub mod parser;
pub mod pipeline;

mod user_agent;
mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use archive::{ExtractError, ExtractionSummary, extract_archive};
pub use cache::{CacheError, CacheLock, CacheStore};
pub use detect::{DetectError, DetectionMethod, EntryPoint, find_entry_point};
pub use download::{FetchError, HttpFetcher, SourceFetcher};
pub use inline::{Combined, DEFAULT_MAX_DEPTH, InlineStats, Inliner, combine_sources};
pub use parser::{ArxivId, ParseError, parse_reference};
pub use pipeline::{
    FailureKind, NoopObserver, Pipeline, PipelineConfig, PipelineError, PipelineEvent,
    PipelineObserver, Resolution, ResolveOptions, TracingObserver,
};
