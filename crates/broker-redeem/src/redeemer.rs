//! The capability validation and secret sealing operation (C3).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use broker_capability::CapabilityToken;
use broker_core::tunables::USED_CAPABILITY_RETENTION;
use broker_core::atomic::write_json_sorted;
use broker_crypto::{cipher, compute_hmac, constant_time_eq, derive_session_key};
use broker_store::BrokerStore;

use crate::error::{RedeemError, RedeemResult};
use crate::record::SealedRecord;

fn load_token(capability_path: &Path) -> RedeemResult<CapabilityToken> {
    let raw = fs::read_to_string(capability_path)?;
    serde_json::from_str(&raw).map_err(|e| RedeemError::InvalidToken(e.to_string()))
}

fn sealed_records_dir(capability_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => capability_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("secrets"),
    }
}

/// Validate the capability token at `capability_path`, seal the requested
/// `secret_names`, and write one `.sealed` record per secret under
/// `output_dir` (or, if `None`, `capability_path`'s parent directory's
/// `secrets/` subdirectory).
///
/// On success, `capability_id` is recorded in the used-capability ledger
/// unless `allow_reuse` is set, in which case the ledger is left untouched
/// so a subsequent redemption is still possible.
///
/// # Errors
///
/// Returns a [`RedeemError`] variant matching the first validation step
/// that fails: a malformed token, an unknown stub, an HMAC or session-key
/// mismatch, expiry, replay, or a missing secret value.
pub fn redeem(
    store: &mut BrokerStore,
    capability_path: &Path,
    secret_names: &[String],
    output_dir: Option<&Path>,
    allow_reuse: bool,
) -> RedeemResult<Vec<SealedRecord>> {
    let token = load_token(capability_path)?;

    let key_hex = store
        .keys
        .get(&token.stub)
        .map(str::to_string)
        .ok_or_else(|| RedeemError::UnknownStub {
            stub: token.stub.clone(),
        })?;

    let payload = token.signing_payload();

    let expected_hmac = compute_hmac(&key_hex, &payload)?;
    if !constant_time_eq(&expected_hmac, &token.hmac) {
        return Err(RedeemError::HmacMismatch);
    }

    let expected_session_key = derive_session_key(&key_hex, &payload)?;
    if !constant_time_eq(&expected_session_key, &token.session_key) {
        return Err(RedeemError::SessionKeyMismatch);
    }

    let now = Utc::now();
    if token.expires_at <= now {
        return Err(RedeemError::Expired);
    }

    if store.state.is_used(&token.capability_id) && !allow_reuse {
        return Err(RedeemError::AlreadyRedeemed);
    }

    let dir = sealed_records_dir(capability_path, output_dir);
    fs::create_dir_all(&dir)?;

    let mut records = Vec::with_capacity(secret_names.len());
    for name in secret_names {
        let plaintext = store
            .secrets
            .get(&token.stub, name)
            .map(str::to_string)
            .ok_or_else(|| RedeemError::MissingSecret {
                stub: token.stub.clone(),
                name: name.clone(),
            })?;

        let ciphertext = cipher::seal(&token.session_key, &plaintext)?;
        let record = SealedRecord::new(
            token.stub.clone(),
            name.clone(),
            token.capability_id.clone(),
            ciphertext,
        );
        write_json_sorted(&dir.join(format!("{name}.sealed")), &record)?;

        tracing::info!(
            stub = %token.stub,
            capability_id = %token.capability_id,
            secret = %name,
            "sealed secret"
        );
        records.push(record);
    }

    store
        .state
        .mark_used(&token.capability_id, now, USED_CAPABILITY_RETENTION);
    store.save_state()?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::testutil::BrokerFixture;

    fn setup(secret_value: &str) -> (BrokerFixture, BrokerStore, PathBuf) {
        let fixture = BrokerFixture::new();
        let mut store = BrokerStore::open(fixture.home.clone()).unwrap();
        store.init(&["svc".to_string()]).unwrap();
        store.secrets.set("svc", "TOKEN", secret_value.to_string());
        store.save_secrets().unwrap();

        let tokens = broker_capability::issue(
            &mut store,
            &fixture.cap_root,
            "sess-1",
            &["svc".to_string()],
            10,
        )
        .unwrap();
        let token = &tokens[0];
        let path = fixture
            .cap_root
            .stub_dir("svc")
            .join(format!("{}.json", token.capability_id));
        (fixture, store, path)
    }

    #[test]
    fn happy_path_seals_and_marks_used() {
        let (fixture, mut store, path) = setup("hunter2");
        let records = redeem(
            &mut store,
            &path,
            &["TOKEN".to_string()],
            None,
            false,
        )
        .unwrap();
        assert_eq!(records.len(), 1);

        let raw = fs::read_to_string(&path).unwrap();
        let token: CapabilityToken = serde_json::from_str(&raw).unwrap();
        let plaintext = cipher::unseal(&token.session_key, &records[0].ciphertext).unwrap();
        assert_eq!(plaintext, "hunter2");
        assert_eq!(store.state.used_capability_count(), 1);
        let _ = fixture;
    }

    #[test]
    fn replay_is_rejected_and_ledger_unchanged() {
        let (_fixture, mut store, path) = setup("hunter2");
        redeem(&mut store, &path, &["TOKEN".to_string()], None, false).unwrap();
        assert_eq!(store.state.used_capability_count(), 1);

        let err = redeem(&mut store, &path, &["TOKEN".to_string()], None, false).unwrap_err();
        assert!(matches!(err, RedeemError::AlreadyRedeemed));
        assert_eq!(store.state.used_capability_count(), 1);
    }

    #[test]
    fn tampered_hmac_is_rejected() {
        let (_fixture, mut store, path) = setup("hunter2");
        let raw = fs::read_to_string(&path).unwrap();
        let mut token: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let hmac = token["hmac"].as_str().unwrap().to_string();
        let mut flipped: Vec<char> = hmac.chars().collect();
        flipped[0] = if flipped[0] == '0' { '1' } else { '0' };
        token["hmac"] = serde_json::Value::String(flipped.into_iter().collect());
        fs::write(&path, serde_json::to_string(&token).unwrap()).unwrap();

        let err = redeem(&mut store, &path, &["TOKEN".to_string()], None, false).unwrap_err();
        assert!(matches!(err, RedeemError::HmacMismatch));
    }

    #[test]
    fn expired_capability_is_rejected() {
        let (_fixture, mut store, path) = setup("hunter2");
        let raw = fs::read_to_string(&path).unwrap();
        let mut token: serde_json::Value = serde_json::from_str(&raw).unwrap();
        token["expires_at"] = serde_json::Value::String(
            (Utc::now() - chrono::Duration::seconds(1)).to_rfc3339(),
        );
        fs::write(&path, serde_json::to_string(&token).unwrap()).unwrap();

        let err = redeem(&mut store, &path, &["TOKEN".to_string()], None, false).unwrap_err();
        assert!(matches!(err, RedeemError::Expired));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let (_fixture, mut store, path) = setup("hunter2");
        let err = redeem(&mut store, &path, &["MISSING".to_string()], None, false).unwrap_err();
        assert!(matches!(err, RedeemError::MissingSecret { .. }));
    }
}
