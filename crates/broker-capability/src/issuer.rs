//! The rate-limited issuance operation (C2).

use chrono::Utc;
use rand::RngCore;

use broker_core::{tunables, CapRoot};
use broker_core::atomic::write_json_sorted;
use broker_store::BrokerStore;

use crate::error::{IssueError, IssueResult};
use crate::token::CapabilityToken;

fn random_nonce_hex() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn now_unix_secs() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_millis()) / 1000.0
}

/// Issue capability tokens for `stubs` under one shared `session_id` and
/// `expires_at`, writing `<cap_root>/<stub>/<capability_id>.json` for every
/// stub that has a broker key.
///
/// Stubs that are not present in `store.keys` are silently skipped; if
/// none of the requested stubs produced a token the call fails with
/// [`IssueError::NoCapabilitiesIssued`].
///
/// # Errors
///
/// Returns [`IssueError::RateLimitExceeded`] if the sliding issuance
/// window is already at its limit, [`IssueError::NoCapabilitiesIssued`]
/// if no requested stub has a key, or a wrapped store/crypto/I/O error.
pub fn issue(
    store: &mut BrokerStore,
    cap_root: &CapRoot,
    session_id: &str,
    stubs: &[String],
    ttl_minutes: i64,
) -> IssueResult<Vec<CapabilityToken>> {
    let rate_limit = tunables::rate_limit();
    let now = now_unix_secs();
    if !store
        .state
        .check_and_record_issuance(rate_limit.window, rate_limit.limit, now)
    {
        store.save_state()?;
        return Err(IssueError::RateLimitExceeded {
            window_secs: rate_limit.window.as_secs(),
            limit: rate_limit.limit,
        });
    }
    store.save_state()?;

    let expires_at = Utc::now() + chrono::Duration::minutes(ttl_minutes);
    let mut issued = Vec::new();

    for stub in stubs {
        let Some(key_hex) = store.keys.get(stub).map(str::to_string) else {
            tracing::debug!(stub = %stub, "skipping unknown stub at issuance");
            continue;
        };

        let capability_id = uuid::Uuid::new_v4().to_string();
        let nonce = random_nonce_hex();
        let payload = broker_crypto::signing_payload(&nonce, session_id, stub, &capability_id);
        let hmac = broker_crypto::compute_hmac(&key_hex, &payload)?;
        let session_key = broker_crypto::derive_session_key(&key_hex, &payload)?;

        let token = CapabilityToken {
            stub: stub.clone(),
            session: session_id.to_string(),
            capability_id: capability_id.clone(),
            nonce,
            expires_at,
            hmac,
            session_key,
        };

        cap_root.ensure_stub(stub)?;
        let token_path = cap_root.stub_dir(stub).join(format!("{capability_id}.json"));
        write_json_sorted(&token_path, &token)?;

        tracing::info!(stub = %stub, capability_id = %capability_id, "issued capability");
        issued.push(token);
    }

    if issued.is_empty() {
        return Err(IssueError::NoCapabilitiesIssued);
    }

    Ok(issued)
}
