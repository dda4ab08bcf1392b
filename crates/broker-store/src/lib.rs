//! Broker Store - the three on-disk stores that back the capability
//! protocol's host side (C1 in the protocol design): the key store, the
//! secret store, and the issuance/ledger state store.
//!
//! Every store file lives under [`broker_core::BrokerHome`] and is
//! persisted through [`broker_core::atomic::write_json_sorted`] —
//! write-temp-then-rename, then chmod `0600` — so a concurrent reader
//! always sees either the old or the new content.
//!
//! # Example
//!
//! ```
//! use broker_core::BrokerHome;
//! use broker_store::BrokerStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let home = BrokerHome::from_path(dir.path());
//! let mut store = BrokerStore::open(home)?;
//! store.init(&["github".to_string()])?;
//! assert!(store.keys.get("github").is_some());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod keys;
pub mod prelude;
pub mod secrets;
pub mod state;

use std::path::Path;

use broker_core::{tunables, BrokerHome};

pub use error::{StoreError, StoreResult};
pub use keys::KeyStore;
pub use secrets::SecretStore;
pub use state::StateStore;

fn maybe_lock_immutable(path: &Path) {
    if tunables::immutable_lock_enabled() {
        broker_core::atomic::try_lock_immutable(path);
    }
}

/// The three on-disk stores, loaded together from one [`BrokerHome`].
///
/// `keys`/`secrets`/`state` are public fields rather than hidden behind
/// accessors: callers (the issuer, the redeemer, the CLI) mutate them
/// directly and then call the matching `save_*` method to persist, mirroring
/// the original source's module-level dictionaries passed around by
/// reference rather than through a facade.
#[derive(Debug)]
pub struct BrokerStore {
    home: BrokerHome,
    /// Stub -> broker key.
    pub keys: KeyStore,
    /// Stub -> (secret name -> plaintext).
    pub secrets: SecretStore,
    /// Issuance history and used-capability ledger.
    pub state: StateStore,
}

impl BrokerStore {
    /// Open (and, if necessary, create) the broker store at `home`.
    ///
    /// The broker directory and the secret/state files are created lazily
    /// if absent, initialized to empty structures. The key store is loaded
    /// as-is — a missing key file is simply an empty key store; only
    /// [`BrokerStore::init`] generates new stub keys.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptedKeyStore`] if `keys.json` exists but
    /// is not valid JSON, or [`StoreError::Io`] for any other I/O failure.
    pub fn open(home: BrokerHome) -> StoreResult<Self> {
        home.ensure()?;

        let keys_path = home.keys_path();
        let keys = KeyStore::load(&keys_path)?;

        let secrets_path = home.secrets_path();
        let secrets_existed = secrets_path.exists();
        let secrets = SecretStore::load(&secrets_path)?;
        if !secrets_existed {
            secrets.save(&secrets_path)?;
            maybe_lock_immutable(&secrets_path);
        }

        let state_path = home.state_path();
        let state_existed = state_path.exists();
        let state = StateStore::load(&state_path)?;
        if !state_existed {
            state.save(&state_path)?;
            maybe_lock_immutable(&state_path);
        }

        Ok(Self {
            home,
            keys,
            secrets,
            state,
        })
    }

    /// Generate a fresh random key for any stub in `stubs` that does not
    /// already have one. Idempotent: re-running with the same stub list
    /// never changes an existing key. Returns whether the key store
    /// changed (and was therefore re-persisted).
    ///
    /// # Errors
    ///
    /// Returns an error if the key store cannot be persisted.
    pub fn init(&mut self, stubs: &[String]) -> StoreResult<bool> {
        let changed = self.keys.ensure_stubs(stubs);
        if changed {
            self.save_keys()?;
        }
        Ok(changed)
    }

    /// Persist the key store.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_keys(&self) -> StoreResult<()> {
        let path = self.home.keys_path();
        self.keys.save(&path)?;
        maybe_lock_immutable(&path);
        Ok(())
    }

    /// Persist the secret store.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_secrets(&self) -> StoreResult<()> {
        let path = self.home.secrets_path();
        self.secrets.save(&path)?;
        maybe_lock_immutable(&path);
        Ok(())
    }

    /// Persist the issuance/ledger state store.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_state(&self) -> StoreResult<()> {
        self.state.save(&self.home.state_path())
    }

    /// The broker home this store was opened from.
    #[must_use]
    pub fn home(&self) -> &BrokerHome {
        &self.home
    }
}
