//! The capability token: a short-lived, HMAC-bound authorization to
//! redeem specific secrets for a specific session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A capability token as written to `<output_dir>/<stub>/<capability_id>.json`.
///
/// Every field round-trips through JSON with sorted keys; field order here
/// is for readability only and has no bearing on serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityToken {
    /// Stub name this capability authorizes.
    pub stub: String,
    /// Opaque session identifier supplied by the issuing caller.
    pub session: String,
    /// Unique identifier for this issuance (UUID v4).
    pub capability_id: String,
    /// 16 random bytes, hex-encoded, folded into the signing payload.
    pub nonce: String,
    /// Absolute expiry, strictly in the future at issuance.
    pub expires_at: DateTime<Utc>,
    /// Hex HMAC-SHA256 over `nonce|session|stub|capability_id`.
    pub hmac: String,
    /// Hex HMAC-SHA256 over the same payload plus the seal domain
    /// separator, used as the symmetric sealing key.
    pub session_key: String,
}

impl CapabilityToken {
    /// The canonical signing payload this token's `hmac`/`session_key`
    /// were computed over.
    #[must_use]
    pub fn signing_payload(&self) -> String {
        broker_crypto::signing_payload(&self.nonce, &self.session, &self.stub, &self.capability_id)
    }

    /// Whether this token is still live at `now` (strictly, not
    /// inclusive — a token expiring exactly at `now` is already dead).
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CapabilityToken {
        let payload = broker_crypto::signing_payload("nonce", "sess", "svc", "cap-1");
        let key = "00".repeat(32);
        CapabilityToken {
            stub: "svc".to_string(),
            session: "sess".to_string(),
            capability_id: "cap-1".to_string(),
            nonce: "nonce".to_string(),
            expires_at: Utc::now() + chrono::Duration::minutes(10),
            hmac: broker_crypto::compute_hmac(&key, &payload).unwrap(),
            session_key: broker_crypto::derive_session_key(&key, &payload).unwrap(),
        }
    }

    #[test]
    fn signing_payload_matches_fields() {
        let token = sample();
        assert_eq!(token.signing_payload(), "nonce|sess|svc|cap-1");
    }

    #[test]
    fn liveness_respects_expiry() {
        let mut token = sample();
        assert!(token.is_live_at(Utc::now()));
        token.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(!token.is_live_at(Utc::now()));
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let token = sample();
        let json = serde_json::to_string(&token).unwrap();
        let reloaded: CapabilityToken = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.capability_id, token.capability_id);
        assert_eq!(reloaded.hmac, token.hmac);
        assert_eq!(reloaded.session_key, token.session_key);
    }
}
