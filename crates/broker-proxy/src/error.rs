//! Proxy error types.
//!
//! Per-request failures (bad destination, upstream timeout, upstream
//! error) are mapped directly to HTTP status codes at the request-handling
//! call site rather than raised through this enum — mirroring the
//! original source's `send_error` calls rather than propagating a `Result`
//! up through the request path. This enum only covers startup failures.

use thiserror::Error;

/// Errors raised while starting the proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {reason}")]
    BindFailure {
        /// The address that failed to bind.
        addr: String,
        /// The underlying OS error text.
        reason: String,
    },

    /// `--target` was not a valid absolute URL.
    #[error("invalid target URL '{target}': {reason}")]
    ConfigParse {
        /// The offending value.
        target: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// `BROKER_REQUIRE_PROXY` is set but no outbound `HTTPS_PROXY`/
    /// `HTTP_PROXY` environment variable is present.
    #[error("BROKER_REQUIRE_PROXY is set but no outbound proxy environment variable is configured")]
    OutboundProxyRequired,
}

/// Result type for proxy startup operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
