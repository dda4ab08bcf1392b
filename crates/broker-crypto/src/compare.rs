//! Constant-time equality for capability-token integrity checks.
//!
//! Both the `hmac` and `session_key` fields must be compared in constant
//! time — a naive byte-wise comparison leaks timing information an attacker
//! could use to forge a valid token byte-by-byte. `subtle`'s
//! [`ConstantTimeEq`] is used for both, even though it compares hex strings
//! rather than raw bytes: the length of a well-formed field never varies
//! with secret data, so comparing the encoded form is equivalent in this
//! protocol and avoids an extra decode step on the hot path.

use subtle::ConstantTimeEq;

/// Compare two strings in constant time with respect to their contents.
/// Returns `false` immediately for mismatched lengths, which is not secret
/// (token field lengths are fixed by the protocol, not by key material).
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
