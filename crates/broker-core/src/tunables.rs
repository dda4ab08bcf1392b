//! Environment-overridable tunable defaults.
//!
//! Every tunable follows the same shape as [`crate::dirs`]'s directory
//! overrides: read an env var, fall back to a literal default, and log at
//! `debug` which source won.

use std::time::Duration;

/// Sliding-window rate limit on capability issuance.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Window length.
    pub window: Duration,
    /// Max issuances allowed within the window.
    pub limit: usize,
}

/// Default capability TTL, in minutes, when the caller does not specify one.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Default upstream timeout for the HTTPS/SSE proxy.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(60);

/// Age past which used-capability ledger entries may be evicted.
pub const USED_CAPABILITY_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

fn env_usize(var: &str, default: usize) -> usize {
    match std::env::var(var) {
        Ok(raw) => match raw.parse() {
            Ok(value) => {
                tracing::debug!(var, value, "tunable overridden from environment");
                value
            }
            Err(_) => {
                tracing::warn!(var, raw, "ignoring unparsable tunable override, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_bool(var: &str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(raw) => {
            let value = !matches!(raw.as_str(), "0" | "" | "false" | "False");
            tracing::debug!(var, value, "tunable overridden from environment");
            value
        }
        Err(_) => default,
    }
}

/// Resolve the issuance rate limit from `ISSUE_WINDOW_SECONDS` /
/// `ISSUE_WINDOW_LIMIT`, defaulting to 60 seconds / 30 issuances.
#[must_use]
pub fn rate_limit() -> RateLimit {
    RateLimit {
        window: Duration::from_secs(env_usize("ISSUE_WINDOW_SECONDS", 60) as u64),
        limit: env_usize("ISSUE_WINDOW_LIMIT", 30),
    }
}

/// Whether the broker store should attempt to mark freshly written files
/// immutable via the filesystem's immutable attribute. Defaults to on,
/// overridable with `BROKER_IMMUTABLE_LOCK`.
#[must_use]
pub fn immutable_lock_enabled() -> bool {
    env_bool("BROKER_IMMUTABLE_LOCK", true)
}

/// Whether the HTTPS/SSE proxy refuses to start unless an outbound proxy
/// environment variable is present. Overridable with `BROKER_REQUIRE_PROXY`.
#[must_use]
pub fn require_outbound_proxy() -> bool {
    env_bool("BROKER_REQUIRE_PROXY", false)
}
