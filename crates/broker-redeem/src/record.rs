//! The sealed secret record: a single (capability, secret name) pair's
//! ciphertext, written at `<output_dir>/<secret_name>.sealed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use broker_crypto::cipher::ALGORITHM;

/// A sealed secret record as written by the redeemer and read by the
/// stub launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedRecord {
    /// Stub the originating capability was issued for.
    pub stub: String,
    /// Name of the sealed secret.
    pub secret: String,
    /// Capability that authorized this seal.
    pub capability_id: String,
    /// When the record was written.
    pub issued_at: DateTime<Utc>,
    /// Sealing algorithm tag, always [`ALGORITHM`].
    pub algorithm: String,
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

impl SealedRecord {
    /// Build a new record for `stub`/`secret`/`capability_id`, sealing
    /// `ciphertext` under the current algorithm tag.
    #[must_use]
    pub fn new(stub: String, secret: String, capability_id: String, ciphertext: String) -> Self {
        Self {
            stub,
            secret,
            capability_id,
            issued_at: Utc::now(),
            algorithm: ALGORITHM.to_string(),
            ciphertext,
        }
    }

    /// Whether this record's `stub`/`capability_id` match the capability
    /// attempting to unseal it.
    #[must_use]
    pub fn matches(&self, stub: &str, capability_id: &str) -> bool {
        self.stub == stub && self.capability_id == capability_id
    }
}
