//! HMAC-SHA256 binding for capability tokens and session-key derivation.
//!
//! The capability protocol binds every token to its issuing broker key with
//! two related HMACs over the same canonical payload:
//!
//! - `hmac` authenticates the token itself.
//! - `session_key` is a second HMAC, over the payload plus a domain
//!   separator (`"seal"`), used only as a symmetric key for [`crate::cipher`].
//!
//! Both are computed the same way; only the payload differs.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};

type HmacSha256 = Hmac<Sha256>;

/// Domain separator appended to the signing payload when deriving a session
/// key, so that `hmac` and `session_key` can never collide for the same
/// broker key even if an implementation bug reused one HMAC for both.
const SEAL_DOMAIN: &str = "seal";

/// Build the canonical signing payload `nonce|session|stub|capability_id`.
#[must_use]
pub fn signing_payload(nonce: &str, session: &str, stub: &str, capability_id: &str) -> String {
    format!("{nonce}|{session}|{stub}|{capability_id}")
}

fn hmac_hex(key_hex: &str, payload: &str) -> CryptoResult<String> {
    let key = hex::decode(key_hex).map_err(|e| CryptoError::InvalidHexEncoding(e.to_string()))?;
    if key.is_empty() {
        return Err(CryptoError::EmptyKey);
    }
    let mut mac =
        HmacSha256::new_from_slice(&key).expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compute the token-authenticating `hmac` field over the canonical payload.
///
/// # Errors
///
/// Returns an error if `key_hex` is not valid hex or decodes to zero bytes.
pub fn compute_hmac(key_hex: &str, payload: &str) -> CryptoResult<String> {
    hmac_hex(key_hex, payload)
}

/// Derive the `session_key` field: an HMAC over the payload plus the seal
/// domain separator, using the same broker key.
///
/// # Errors
///
/// Returns an error if `key_hex` is not valid hex or decodes to zero bytes.
pub fn derive_session_key(key_hex: &str, payload: &str) -> CryptoResult<String> {
    hmac_hex(key_hex, &format!("{payload}|{SEAL_DOMAIN}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_and_session_key_differ() {
        let key = "00".repeat(32);
        let payload = signing_payload("nonce", "sess", "stub", "capid");
        let h = compute_hmac(&key, &payload).unwrap();
        let sk = derive_session_key(&key, &payload).unwrap();
        assert_ne!(h, sk);
        assert_eq!(h.len(), 64);
        assert_eq!(sk.len(), 64);
    }

    #[test]
    fn hmac_is_deterministic() {
        let key = "ab".repeat(32);
        let payload = "a|b|c|d";
        assert_eq!(
            compute_hmac(&key, payload).unwrap(),
            compute_hmac(&key, payload).unwrap()
        );
    }

    #[test]
    fn different_keys_produce_different_hmacs() {
        let payload = "a|b|c|d";
        let h1 = compute_hmac(&"00".repeat(32), payload).unwrap();
        let h2 = compute_hmac(&"11".repeat(32), payload).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn empty_key_rejected() {
        let err = compute_hmac("", "payload").unwrap_err();
        assert!(matches!(err, CryptoError::EmptyKey));
    }

    #[test]
    fn invalid_hex_key_rejected() {
        let err = compute_hmac("not-hex", "payload").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidHexEncoding(_)));
    }
}
