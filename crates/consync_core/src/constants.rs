//! Shared constants used across Consync crates.

/// Default API base URL for CLI/API clients.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8001";

/// Default page size requested from collection endpoints.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Default upper bound accepted for a single page request.
pub const MAX_PAGE_LIMIT: usize = 500;

/// Default request timeout for API clients, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Lower bound for background refresh intervals, in milliseconds.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 5_000;

/// Upper bound for background refresh intervals, in milliseconds.
pub const MAX_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Refresh interval applied when a resource type has no explicit entry.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10_000;

/// Clamp a configured refresh interval into the supported range.
pub fn clamp_refresh_interval_ms(ms: u64) -> u64 {
    ms.clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS)
}
