//! Broker Crypto - the capability protocol's cryptographic primitives.
//!
//! This crate provides:
//! - HMAC-SHA256 token binding and session-key derivation
//! - The `xor-sha256` sealing cipher shared by the redeemer and launcher
//! - Constant-time comparison for integrity checks
//!
//! # Security Philosophy
//!
//! A capability token's integrity comes entirely from its `hmac`, computed
//! over the token payload with the issuing stub's broker key. The sealing
//! cipher in [`cipher`] provides confidentiality for secret values in
//! transit through the filesystem, not integrity — do not mistake it for an
//! authenticated cipher.
//!
//! # Example
//!
//! ```
//! use broker_crypto::{hmac, cipher, compare};
//!
//! let key = "ab".repeat(32);
//! let payload = hmac::signing_payload("nonce", "session", "stub", "capid");
//! let token_hmac = hmac::compute_hmac(&key, &payload).unwrap();
//! let session_key = hmac::derive_session_key(&key, &payload).unwrap();
//!
//! let sealed = cipher::seal(&session_key, "hunter2").unwrap();
//! let plain = cipher::unseal(&session_key, &sealed).unwrap();
//! assert_eq!(plain, "hunter2");
//!
//! assert!(compare::constant_time_eq(&token_hmac, &token_hmac));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod cipher;
pub mod compare;
mod error;
pub mod hmac;

pub use compare::constant_time_eq;
pub use error::{CryptoError, CryptoResult};
