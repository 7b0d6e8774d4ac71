//! Recursive expansion of `\input{..}` / `\include{..}` directives.
//!
//! Each directive target is resolved against the including file's directory
//! (`.tex` appended when missing, path normalized lexically) and replaced by
//! the first applicable rule:
//!
//! 1. already visited in this pass → `% Skipping already included file: <name>`
//! 2. no such file, or a target outside the extraction root →
//!    `% File not found: <name>`
//! 3. otherwise the file is marked visited and its expanded text substituted
//!
//! A file at depth greater than the bound is not read; the directive that
//! asked for it becomes `% Recursion limit reached while including: <name>`
//! and its siblings are expanded normally. Unreadable files become
//! `% Error reading file: <basename>`. Nothing here aborts the combination.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use arxiv_latex_core::inline::{DEFAULT_MAX_DEPTH, Inliner};
//!
//! let inliner = Inliner::new("/tmp/paper", DEFAULT_MAX_DEPTH);
//! let combined = inliner.combine(Path::new("/tmp/paper/main.tex"));
//! println!("{}", combined.text);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::detect::SOURCE_EXTENSION;
use crate::utils::{compile_static_regex, normalize_path};

/// Default inclusion depth bound.
pub const DEFAULT_MAX_DEPTH: usize = 10;

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\\(?:input|include)\{([^}]+)\}"));

/// Signals raised while expanding one file.
///
/// Only ever observed by the caller that asked for the file; it is turned
/// into an in-place marker rather than propagated further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InlineError {
    /// The file sits deeper than the configured bound.
    #[error("maximum inclusion depth {max_depth} exceeded at {path} (depth {depth})")]
    RecursionLimitExceeded {
        /// The file that was not expanded.
        path: PathBuf,
        /// Its depth.
        depth: usize,
        /// The configured bound.
        max_depth: usize,
    },
}

/// Counters collected during one combination pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStats {
    /// Files read and expanded, the entry file included.
    pub files_read: usize,
    /// Directives replaced by the "already included" marker.
    pub skipped_duplicates: usize,
    /// Directives replaced by the "not found" marker.
    pub missing: usize,
    /// Directives replaced by the "recursion limit" marker.
    pub depth_truncated: usize,
    /// Files replaced by the "error reading" marker.
    pub read_failures: usize,
}

impl InlineStats {
    /// Total number of markers emitted.
    #[must_use]
    pub fn markers(&self) -> usize {
        self.skipped_duplicates + self.missing + self.depth_truncated + self.read_failures
    }
}

/// The flattened document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combined {
    /// Fully substituted text of the entry file.
    pub text: String,
    /// What happened along the way.
    pub stats: InlineStats,
}

/// Marker for a directive whose target was already inlined.
#[must_use]
pub fn skipped_marker(name: &str) -> String {
    format!("% Skipping already included file: {name}\n")
}

/// Marker for a directive whose target does not exist.
#[must_use]
pub fn not_found_marker(name: &str) -> String {
    format!("% File not found: {name}\n")
}

/// Marker for a directive truncated by the depth bound.
#[must_use]
pub fn recursion_marker(name: &str) -> String {
    format!("% Recursion limit reached while including: {name}\n")
}

/// Marker for a file that could not be read.
#[must_use]
pub fn read_error_marker(basename: &str) -> String {
    format!("% Error reading file: {basename}\n")
}

/// Flattens a source tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct Inliner {
    root: PathBuf,
    max_depth: usize,
}

impl Inliner {
    /// Creates an inliner for the extraction root `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_depth: usize) -> Self {
        Self {
            root: normalize_path(&root.into()),
            max_depth,
        }
    }

    /// Configured depth bound.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Expands `entry` with a fresh visited set.
    ///
    /// The entry file itself is recorded as visited before its directives
    /// are expanded, so a directive pointing back at it is skipped.
    #[instrument(skip(self), fields(entry = %entry.display(), max_depth = self.max_depth))]
    pub fn combine(&self, entry: &Path) -> Combined {
        let entry = normalize_path(entry);
        let mut visited = HashSet::from([entry.clone()]);
        let mut stats = InlineStats::default();

        let text = match self.inline_file(&entry, 0, &mut visited, &mut stats) {
            Ok(text) => text,
            Err(error) => {
                warn!(error = %error, "entry file beyond depth bound");
                stats.depth_truncated += 1;
                recursion_marker(&display_name(&entry))
            }
        };

        info!(
            files = stats.files_read,
            markers = stats.markers(),
            bytes = text.len(),
            "sources combined"
        );
        Combined { text, stats }
    }

    /// Expands the directives of `path`, which sits at `depth`.
    ///
    /// `visited` holds every resolved path already inlined in this pass and
    /// is updated as files are inlined.
    ///
    /// # Errors
    ///
    /// Returns [`InlineError::RecursionLimitExceeded`] when `depth` is past the
    /// bound; the file is not read in that case.
    pub fn inline_file(
        &self,
        path: &Path,
        depth: usize,
        visited: &mut HashSet<PathBuf>,
        stats: &mut InlineStats,
    ) -> Result<String, InlineError> {
        if depth > self.max_depth {
            return Err(InlineError::RecursionLimitExceeded {
                path: path.to_path_buf(),
                depth,
                max_depth: self.max_depth,
            });
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to read source file");
                stats.read_failures += 1;
                return Ok(read_error_marker(&display_name(path)));
            }
        };
        stats.files_read += 1;

        let base_dir = path.parent().unwrap_or(self.root.as_path()).to_path_buf();
        let expanded = DIRECTIVE_RE.replace_all(&content, |caps: &Captures<'_>| {
            self.expand_directive(&caps[1], &base_dir, depth, visited, stats)
        });
        Ok(expanded.into_owned())
    }

    fn expand_directive(
        &self,
        target: &str,
        base_dir: &Path,
        depth: usize,
        visited: &mut HashSet<PathBuf>,
        stats: &mut InlineStats,
    ) -> String {
        let name = with_source_extension(target.trim());
        let Some(resolved) = self.resolve(base_dir, &name) else {
            warn!(target = %name, "include target outside extraction root");
            stats.missing += 1;
            return not_found_marker(&name);
        };

        if visited.contains(&resolved) {
            debug!(target = %name, "skipping already included file");
            stats.skipped_duplicates += 1;
            return skipped_marker(&name);
        }
        if !resolved.is_file() {
            debug!(target = %name, path = %resolved.display(), "included file not found");
            stats.missing += 1;
            return not_found_marker(&name);
        }

        visited.insert(resolved.clone());
        match self.inline_file(&resolved, depth + 1, visited, stats) {
            Ok(text) => text,
            Err(error) => {
                warn!(target = %name, error = %error, "inclusion truncated");
                stats.depth_truncated += 1;
                recursion_marker(&name)
            }
        }
    }

    /// Resolves `name` against the including directory, falling back to the
    /// extraction root when only the latter has it.
    ///
    /// Candidates that normalize to a path outside the root are discarded;
    /// `None` means no candidate stayed inside.
    fn resolve(&self, base_dir: &Path, name: &str) -> Option<PathBuf> {
        let relative = normalize_path(&base_dir.join(name));
        let relative = relative.starts_with(&self.root).then_some(relative);
        if let Some(path) = relative.as_ref().filter(|path| path.is_file()) {
            return Some(path.clone());
        }
        let from_root = normalize_path(&self.root.join(name));
        if from_root.starts_with(&self.root)
            && relative.as_ref() != Some(&from_root)
            && from_root.is_file()
        {
            debug!(target = %name, path = %from_root.display(), "resolved against extraction root");
            return Some(from_root);
        }
        relative
    }
}

/// Convenience wrapper: `Inliner::new(root, max_depth).combine(entry)`.
#[must_use]
pub fn combine_sources(entry: &Path, root: &Path, max_depth: usize) -> Combined {
    Inliner::new(root, max_depth).combine(entry)
}

fn with_source_extension(target: &str) -> String {
    let suffix = format!(".{SOURCE_EXTENSION}");
    if target.ends_with(&suffix) {
        target.to_string()
    } else {
        format!("{target}{suffix}")
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
