//! Key store: `stub -> hex broker key`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use broker_core::atomic::write_json_sorted;

use crate::error::{StoreError, StoreResult};

/// Mapping from stub name to its 32-byte symmetric broker key, hex-encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyStore {
    keys: BTreeMap<String, String>,
}

fn random_key_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl KeyStore {
    /// Load the key store from `path`.
    ///
    /// A missing file is an empty store. A present-but-unparseable file is
    /// the one fatal corruption case in the whole protocol: the broker
    /// never guesses at key material.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptedKeyStore`] if `path` exists but is not
    /// valid JSON, or [`StoreError::Io`] if it cannot be read.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| StoreError::CorruptedKeyStore(e.to_string()))
    }

    /// Persist the key store to `path` (sorted keys, mode `0600`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        write_json_sorted(path, &self.keys)?;
        Ok(())
    }

    /// The broker key for `stub`, if one has been generated.
    #[must_use]
    pub fn get(&self, stub: &str) -> Option<&str> {
        self.keys.get(stub).map(String::as_str)
    }

    /// Generate and insert a fresh random key for any stub in `stubs` that
    /// does not already have one. Existing keys are left untouched —
    /// `init` is idempotent. Returns whether any key was generated.
    pub fn ensure_stubs(&mut self, stubs: &[String]) -> bool {
        let mut changed = false;
        for stub in stubs {
            if stub.is_empty() {
                continue;
            }
            if !self.keys.contains_key(stub) {
                self.keys.insert(stub.clone(), random_key_hex());
                changed = true;
            }
        }
        changed
    }

    /// Whether the store currently has no keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
