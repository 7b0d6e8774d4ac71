//! Explicit pipeline configuration.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::download::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, READ_TIMEOUT_SECS};
use crate::inline::DEFAULT_MAX_DEPTH;

use super::PipelineError;

/// Smallest accepted inclusion depth bound.
pub const MIN_MAX_DEPTH: usize = 1;
/// Largest accepted inclusion depth bound.
pub const MAX_MAX_DEPTH: usize = 64;
/// Accepted range for either HTTP timeout, in seconds.
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Cache subdirectory name under `$XDG_CACHE_HOME`.
const XDG_CACHE_DIR_NAME: &str = "arxiv-latex";
/// Cache directory name under `$HOME` when no XDG cache home is set.
const HOME_CACHE_DIR_NAME: &str = ".arxiv_cache";

/// Everything a [`Pipeline`](super::Pipeline) needs to know up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root of the archive cache.
    pub cache_root: PathBuf,
    /// Inclusion depth bound.
    pub max_depth: usize,
    /// E-print endpoint base URL.
    pub base_url: String,
    /// HTTP connect timeout.
    pub connect_timeout_secs: u64,
    /// HTTP whole-request timeout.
    pub read_timeout_secs: u64,
}

impl PipelineConfig {
    /// Default settings with an explicit cache root.
    #[must_use]
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }

    /// Checks every field against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.cache_root.as_os_str().is_empty() {
            return Err(PipelineError::invalid_config(
                "cache_root",
                "must not be empty",
            ));
        }
        if !(MIN_MAX_DEPTH..=MAX_MAX_DEPTH).contains(&self.max_depth) {
            return Err(PipelineError::invalid_config(
                "max_depth",
                format!(
                    "{} is outside {MIN_MAX_DEPTH}..={MAX_MAX_DEPTH}",
                    self.max_depth
                ),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(PipelineError::invalid_config(
                "base_url",
                "must not be empty",
            ));
        }
        validate_timeout("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout(field: &'static str, value: u64) -> Result<(), PipelineError> {
    if TIMEOUT_RANGE_SECS.contains(&value) {
        return Ok(());
    }
    Err(PipelineError::invalid_config(
        field,
        format!(
            "{value} is outside {}..={}",
            TIMEOUT_RANGE_SECS.start(),
            TIMEOUT_RANGE_SECS.end()
        ),
    ))
}

/// Resolves the default cache root.
///
/// Priority:
/// 1. `$XDG_CACHE_HOME/arxiv-latex`
/// 2. `$HOME/.arxiv_cache`
#[must_use]
pub fn default_cache_root() -> Option<PathBuf> {
    cache_root_from(
        env_var_non_empty_os("XDG_CACHE_HOME"),
        env_var_non_empty_os("HOME"),
    )
}

fn cache_root_from(xdg_cache_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_cache_home {
        return Some(PathBuf::from(xdg).join(XDG_CACHE_DIR_NAME));
    }
    home.map(|home| PathBuf::from(home).join(HOME_CACHE_DIR_NAME))
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
