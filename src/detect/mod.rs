//! Entry-point detection for an extracted source tree.
//!
//! Three heuristics run in strict priority order; the first to produce a
//! result wins:
//!
//! 1. **Conventional name**: the first `.tex` file (in traversal order)
//!    whose base name, compared case-insensitively, is one of
//!    [`CONVENTIONAL_NAMES`].
//! 2. **Structural score**: one point per structural marker present in the
//!    file (presence, not frequency; max 6). The strictly highest score wins,
//!    ties go to the first file seen. A best score of zero is no result.
//!    Unreadable files are skipped.
//! 3. **Largest file**: the biggest `.tex` file; ties go to the first seen.
//!
//! Traversal is depth-first with directory entries sorted by file name, so
//! "first seen" is stable across filesystems.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::utils::compile_static_regex;

/// Extension of document-source files.
pub const SOURCE_EXTENSION: &str = "tex";

/// Base names conventionally used for the root document.
pub const CONVENTIONAL_NAMES: [&str; 5] = [
    "main.tex",
    "paper.tex",
    "content.tex",
    "article.tex",
    "thesis.tex",
];

/// Structural markers scored by heuristic 2.
const MARKER_PATTERNS: [&str; 6] = [
    r"\\documentclass",
    r"\\begin\{document\}",
    r"\\title\{",
    r"\\author\{",
    r"\\maketitle",
    r"\\usepackage",
];

static MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MARKER_PATTERNS
        .iter()
        .map(|pattern| compile_static_regex(pattern))
        .collect()
});

/// Detection failed because the tree holds no document-source files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    /// No `.tex` file under the root.
    #[error("no .tex file found under {root}\n  Suggestion: The source bundle may be PDF-only or use another format")]
    NoEntryPointFound {
        /// The searched root.
        root: PathBuf,
    },
}

/// Which heuristic selected the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// Matched one of [`CONVENTIONAL_NAMES`].
    ConventionalName,
    /// Highest structural score.
    StructuralScore {
        /// Number of distinct markers found (1..=6).
        score: usize,
    },
    /// Largest source file.
    LargestFile,
}

impl DetectionMethod {
    /// Stable label for logs and CLI output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConventionalName => "conventional-name",
            Self::StructuralScore { .. } => "structural-score",
            Self::LargestFile => "largest-file",
        }
    }
}

/// The selected root document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Path of the entry file.
    pub path: PathBuf,
    /// Heuristic that chose it.
    pub method: DetectionMethod,
}

/// A discovered `.tex` file, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// File path.
    pub path: PathBuf,
    /// Size in bytes (0 if metadata was unavailable).
    pub size: u64,
}

/// Selects the document entry point under `root`.
///
/// # Errors
///
/// Returns [`DetectError::NoEntryPointFound`] if `root` contains no `.tex`
/// files.
#[instrument(fields(root = %root.display()))]
pub fn find_entry_point(root: &Path) -> Result<EntryPoint, DetectError> {
    let candidates = collect_candidates(root);
    debug!(candidates = candidates.len(), "collected source files");

    let entry = select_entry_point(&candidates).ok_or_else(|| DetectError::NoEntryPointFound {
        root: root.to_path_buf(),
    })?;

    info!(
        path = %entry.path.display(),
        method = entry.method.as_str(),
        "entry point selected"
    );
    Ok(entry)
}

/// Lists `.tex` files under `root` in traversal order.
#[must_use]
pub fn collect_candidates(root: &Path) -> Vec<CandidateFile> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                debug!(error = %error, "skipping unreadable tree entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
        .map(|entry| CandidateFile {
            size: entry.metadata().map(|meta| meta.len()).unwrap_or(0),
            path: entry.into_path(),
        })
        .collect()
}

/// Applies the three heuristics to an ordered candidate list.
#[must_use]
pub fn select_entry_point(candidates: &[CandidateFile]) -> Option<EntryPoint> {
    by_conventional_name(candidates)
        .map(|path| EntryPoint {
            path,
            method: DetectionMethod::ConventionalName,
        })
        .or_else(|| {
            by_structural_score(candidates).map(|(path, score)| EntryPoint {
                path,
                method: DetectionMethod::StructuralScore { score },
            })
        })
        .or_else(|| {
            by_largest_size(candidates).map(|path| EntryPoint {
                path,
                method: DetectionMethod::LargestFile,
            })
        })
}

/// Number of distinct structural markers present in `content`.
#[must_use]
pub fn score_content(content: &str) -> usize {
    MARKERS.iter().filter(|marker| marker.is_match(content)).count()
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

fn by_conventional_name(candidates: &[CandidateFile]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|candidate| {
            candidate
                .path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    let lower = name.to_lowercase();
                    CONVENTIONAL_NAMES.contains(&lower.as_str())
                })
        })
        .map(|candidate| candidate.path.clone())
}

fn by_structural_score(candidates: &[CandidateFile]) -> Option<(PathBuf, usize)> {
    let mut best: Option<(&Path, usize)> = None;
    for candidate in candidates {
        let content = match fs::read_to_string(&candidate.path) {
            Ok(content) => content,
            Err(error) => {
                warn!(path = %candidate.path.display(), error = %error, "skipping unreadable file during scoring");
                continue;
            }
        };
        let score = score_content(&content);
        debug!(path = %candidate.path.display(), score, "scored candidate");
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((&candidate.path, score));
        }
    }

    best.filter(|(_, score)| *score > 0)
        .map(|(path, score)| (path.to_path_buf(), score))
}

fn by_largest_size(candidates: &[CandidateFile]) -> Option<PathBuf> {
    let mut best: Option<&CandidateFile> = None;
    for candidate in candidates {
        if best.is_none_or(|current| candidate.size > current.size) {
            best = Some(candidate);
        }
    }
    best.map(|candidate| candidate.path.clone())
}
