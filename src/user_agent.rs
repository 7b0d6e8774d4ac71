//! User-Agent string for e-print requests.
//!
//! arXiv asks automated clients to identify themselves; keep the project URL
//! and crate version in one place.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/arxiv-latex";

/// Default User-Agent for e-print requests (identifies the tool).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("arxiv-latex/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}
