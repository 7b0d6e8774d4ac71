//! Constants for the e-print fetcher (endpoint, timeouts).

/// Default e-print endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://arxiv.org";

/// Path segment of the source-bundle endpoint.
pub const EPRINT_SEGMENT: &str = "e-print";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large source bundles).
pub const READ_TIMEOUT_SECS: u64 = 300;
