//! Per-instance proxy configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum accepted inbound request body size (10 MiB).
pub const MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024;

/// Immutable configuration for one proxy instance.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Name reported on `/health` and injected as `X-CA-Helper`.
    pub name: String,
    /// Local address to listen on, e.g. `127.0.0.1:8080`.
    pub listen: String,
    /// Upstream base URL; only its host may ever be contacted.
    pub target: Url,
    /// Optional bearer token injected as `Authorization` when the inbound
    /// request does not already carry one.
    pub bearer: Option<String>,
    /// Per-request upstream timeout.
    pub timeout: Duration,
}

impl ProxyConfig {
    /// Build a config from raw CLI values.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::ConfigParse`] if `target` is not a valid
    /// absolute URL.
    pub fn new(
        name: String,
        listen: String,
        target: &str,
        bearer: Option<String>,
        timeout: Duration,
    ) -> ProxyResult<Self> {
        let target = Url::parse(target).map_err(|e| ProxyError::ConfigParse {
            target: target.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            listen,
            target,
            bearer,
            timeout,
        })
    }
}
