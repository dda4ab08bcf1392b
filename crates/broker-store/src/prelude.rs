//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_store::prelude::*;` to import the essentials.

pub use crate::error::{StoreError, StoreResult};
pub use crate::keys::KeyStore;
pub use crate::secrets::SecretStore;
pub use crate::state::StateStore;
pub use crate::BrokerStore;
