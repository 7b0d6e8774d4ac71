//! Small helpers shared by the pipeline stages.

use std::path::{Component, Path, PathBuf};

use regex::Regex;

/// Compiles a static regex pattern.
///
/// # Panics
///
/// Panics if `pattern` is not a valid regular expression. Only call with
/// compile-time constant patterns covered by tests.
#[must_use]
#[allow(clippy::panic)]
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Lexically normalizes a path: drops `.` segments and folds `..` into the
/// preceding segment without touching the filesystem.
#[must_use]
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
