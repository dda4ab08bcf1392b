//! Redeemer error types.

use thiserror::Error;

/// Errors raised while redeeming a capability token.
#[derive(Debug, Error)]
pub enum RedeemError {
    /// The capability token file could not be parsed or was missing a
    /// required field.
    #[error("invalid capability token: {0}")]
    InvalidToken(String),

    /// No broker key is known for the token's stub.
    #[error("no broker key for stub '{stub}'")]
    UnknownStub {
        /// The stub named by the token.
        stub: String,
    },

    /// The recomputed `hmac` did not match the token's `hmac` field.
    #[error("HMAC mismatch")]
    HmacMismatch,

    /// The recomputed `session_key` did not match the token's
    /// `session_key` field.
    #[error("session key mismatch")]
    SessionKeyMismatch,

    /// `expires_at` is not strictly in the future.
    #[error("capability expired")]
    Expired,

    /// `capability_id` is already present in the used-capability ledger
    /// and `allow_reuse` was not set.
    #[error("capability already redeemed")]
    AlreadyRedeemed,

    /// A requested secret name has no plaintext value under the token's
    /// stub.
    #[error("no secret named '{name}' stored for stub '{stub}'")]
    MissingSecret {
        /// The stub the secret was requested under.
        stub: String,
        /// The requested secret name.
        name: String,
    },

    /// The underlying broker store failed to load, persist, or look up a
    /// key or secret.
    #[error(transparent)]
    Store(#[from] broker_store::StoreError),

    /// Sealing the plaintext, or a hex/base64 decoding step, failed.
    #[error(transparent)]
    Crypto(#[from] broker_crypto::CryptoError),

    /// I/O failure reading the token or writing a sealed record.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RedeemError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for redemption operations.
pub type RedeemResult<T> = Result<T, RedeemError>;
