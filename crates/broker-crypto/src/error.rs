//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// None of these variants carry secret material — only lengths, names, and
/// fixed messages — so `Display`/`Debug` output is always safe to log.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The session key or broker key decoded to an empty byte string.
    #[error("key cannot decode to an empty byte string")]
    EmptyKey,

    /// HMAC over the capability payload did not match the token's `hmac`.
    #[error("HMAC mismatch")]
    HmacMismatch,

    /// Derived session key did not match the token's `session_key`.
    #[error("session key mismatch")]
    SessionKeyMismatch,

    /// Invalid hex encoding.
    #[error("invalid hex encoding: {0}")]
    InvalidHexEncoding(String),

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64Encoding(String),

    /// Decrypted plaintext was not valid UTF-8.
    #[error("decrypted value is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
