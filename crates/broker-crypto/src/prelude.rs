//! Prelude module - commonly used items for convenient import.
//!
//! Use `use broker_crypto::prelude::*;` to import the essentials.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Sealing cipher
pub use crate::cipher::{self, ALGORITHM};

// Constant-time comparison
pub use crate::constant_time_eq;

// HMAC binding / session-key derivation
pub use crate::hmac::{compute_hmac, derive_session_key, signing_payload};
