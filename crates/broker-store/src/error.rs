//! Broker store error types.

use thiserror::Error;

/// Errors raised while reading or writing the broker's three on-disk
/// stores (keys, secrets, issuance/ledger state).
#[derive(Debug, Error)]
pub enum StoreError {
    /// `keys.json` exists but could not be parsed as JSON. Fatal: the
    /// broker refuses to guess at key material.
    #[error("Corrupted key store: {0}")]
    CorruptedKeyStore(String),

    /// I/O failure reading or writing a store file.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for broker store operations.
pub type StoreResult<T> = Result<T, StoreError>;
