//! Shared test fixtures for the broker crates.
//!
//! Kept as a module rather than a standalone crate: the protocol's test
//! surface is small enough that a dedicated fixture crate (as the wider
//! workspace has for its larger surface) would be one more crate to version
//! for little gain. Downstream crates pull this in via
//! `broker-core`'s `testutil` feature.

use std::path::Path;

use crate::dirs::{BrokerHome, CapRoot};

/// A `tempfile::TempDir`-backed broker home plus capability root, wired up
/// the way the real binaries expect `$BROKER_DIR`/`$CAP_ROOT` to point.
pub struct BrokerFixture {
    /// Keeps the temp directory alive for the fixture's lifetime.
    _dir: tempfile::TempDir,
    /// The broker state directory.
    pub home: BrokerHome,
    /// The capability output tree.
    pub cap_root: CapRoot,
}

impl BrokerFixture {
    /// Create a fresh, empty broker fixture under a new temp directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory or its subdirectories cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir for broker fixture");
        let home = BrokerHome::from_path(dir.path().join("broker"));
        let cap_root = CapRoot::from_path(dir.path().join("capabilities"));
        home.ensure().expect("ensure broker home");
        Self {
            _dir: dir,
            home,
            cap_root,
        }
    }

    /// Path to the underlying temp directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self._dir.path()
    }
}

impl Default for BrokerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed literal broker key for deterministic tests: 32 bytes of
/// `0x00..=0x1f` hex-encoded, matching the style of the literal values in
/// the end-to-end scenarios.
#[must_use]
pub fn fixture_broker_key_hex() -> String {
    (0u8..32).map(|b| format!("{b:02x}")).collect()
}
