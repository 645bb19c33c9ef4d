//! Configuration loading from environment variables.

use crate::constants::{
    clamp_refresh_interval_ms, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SERVER_URL,
};
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

/// Runtime configuration for API clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub namespace: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            namespace: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `CONSYNC_SERVER`, `CONSYNC_NAMESPACE`, and
    /// `CONSYNC_TIMEOUT_SECS`, falling back to defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(server) = env::var("CONSYNC_SERVER") {
            let trimmed = server.trim();
            if !trimmed.is_empty() {
                config.server_url = trimmed.trim_end_matches('/').to_string();
            }
        }
        if let Ok(namespace) = env::var("CONSYNC_NAMESPACE") {
            let trimmed = namespace.trim();
            if !trimmed.is_empty() {
                config.namespace = Some(trimmed.to_string());
            }
        }
        if let Ok(timeout) = env::var("CONSYNC_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.trim().parse::<u64>() {
                if secs > 0 {
                    config.request_timeout_secs = secs;
                }
            }
        }
        config
    }
}

/// Parse a boolean-like environment flag value.
///
/// Truthy: `1`, `true`, `yes`, `on`. Falsy: `0`, `false`, `no`, `off`, empty.
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment. Missing or unrecognized values
/// are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

/// Per-resource-type refresh intervals.
///
/// Intervals are configuration constants per resource type, not derived at
/// runtime; all values are clamped into the supported 5s-60s range.
#[derive(Debug, Clone, Default)]
pub struct RefreshIntervals {
    overrides: BTreeMap<String, u64>,
}

impl RefreshIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval for a resource type (plural collection name).
    pub fn set(&mut self, plural: impl Into<String>, interval_ms: u64) {
        self.overrides
            .insert(plural.into(), clamp_refresh_interval_ms(interval_ms));
    }

    /// Interval for a resource type, falling back to the default.
    pub fn interval_for(&self, plural: &str) -> Duration {
        let ms = self
            .overrides
            .get(plural)
            .copied()
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);
        Duration::from_millis(ms)
    }
}
