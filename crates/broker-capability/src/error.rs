//! Capability issuer error types.

use thiserror::Error;

/// Errors raised while issuing capability tokens.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The sliding-window issuance rate limit was exceeded.
    #[error("rate limit exceeded: at most {limit} issuances per {window_secs}s")]
    RateLimitExceeded {
        /// The configured window, in seconds.
        window_secs: u64,
        /// The configured limit.
        limit: usize,
    },

    /// None of the requested stubs had a broker key, so no token was
    /// written for any of them.
    #[error("no capabilities issued: none of the requested stubs are known")]
    NoCapabilitiesIssued,

    /// The underlying broker store failed to load, persist, or look up a
    /// key.
    #[error(transparent)]
    Store(#[from] broker_store::StoreError),

    /// HMAC or session-key derivation failed.
    #[error(transparent)]
    Crypto(#[from] broker_crypto::CryptoError),

    /// I/O failure writing a capability token file.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IssueError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for capability issuance.
pub type IssueResult<T> = Result<T, IssueError>;
