//! Secret store: `stub -> (secret_name -> plaintext)`.
//!
//! The only crate-external code path that is allowed to read plaintext out
//! of this store is the redeemer (`broker-redeem`), which immediately seals
//! it — plaintext never leaves the host broker store in any other form.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use broker_core::atomic::write_json_sorted;

use crate::error::StoreResult;

/// Mapping from stub name to its declared secrets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretStore {
    secrets: BTreeMap<String, BTreeMap<String, String>>,
}

impl SecretStore {
    /// Load the secret store from `path`. A missing or unparseable file is
    /// treated as an empty store (unlike the key store, a corrupt secret
    /// file is not fatal — it simply means no secrets are available yet).
    ///
    /// # Errors
    ///
    /// Returns an error if `path` exists but cannot be read.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    /// Persist the secret store to `path` (sorted keys, mode `0600`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        write_json_sorted(path, &self.secrets)?;
        Ok(())
    }

    /// Look up the plaintext value of `(stub, name)`.
    #[must_use]
    pub fn get(&self, stub: &str, name: &str) -> Option<&str> {
        self.secrets.get(stub)?.get(name).map(String::as_str)
    }

    /// Store or overwrite the plaintext value of `(stub, name)`.
    pub fn set(&mut self, stub: &str, name: &str, value: String) {
        self.secrets
            .entry(stub.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecretStore::load(&dir.path().join("secrets.json")).unwrap();
        assert!(store.get("svc", "TOKEN").is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut store = SecretStore::default();
        store.set("svc", "TOKEN", "hunter2".to_string());
        assert_eq!(store.get("svc", "TOKEN"), Some("hunter2"));
        assert!(store.get("svc", "OTHER").is_none());
        assert!(store.get("other-stub", "TOKEN").is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let mut store = SecretStore::default();
        store.set("svc", "TOKEN", "hunter2".to_string());
        store.save(&path).unwrap();

        let reloaded = SecretStore::load(&path).unwrap();
        assert_eq!(reloaded.get("svc", "TOKEN"), Some("hunter2"));
    }

    #[test]
    fn corrupt_file_recovers_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        fs::write(&path, "not json").unwrap();
        let store = SecretStore::load(&path).unwrap();
        assert!(store.get("svc", "TOKEN").is_none());
    }
}
