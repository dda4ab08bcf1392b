//! Broker Redeem - capability validation and secret sealing (C3).
//!
//! [`redeem`] is the only code path that ever reads plaintext secrets out
//! of the broker store, and the only one that writes [`SealedRecord`]s;
//! the stub launcher (`broker-launcher`) is the only reader of sealed
//! records.
//!
//! # Example
//!
//! ```
//! use broker_core::testutil::BrokerFixture;
//! use broker_store::BrokerStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fixture = BrokerFixture::new();
//! let mut store = BrokerStore::open(fixture.home.clone())?;
//! store.init(&["github".to_string()])?;
//! store.secrets.set("github", "TOKEN", "hunter2".to_string());
//! store.save_secrets()?;
//!
//! let tokens = broker_capability::issue(
//!     &mut store,
//!     &fixture.cap_root,
//!     "session-1",
//!     &["github".to_string()],
//!     10,
//! )?;
//! let token_path = fixture
//!     .cap_root
//!     .stub_dir("github")
//!     .join(format!("{}.json", tokens[0].capability_id));
//!
//! let records = broker_redeem::redeem(
//!     &mut store,
//!     &token_path,
//!     &["TOKEN".to_string()],
//!     None,
//!     false,
//! )?;
//! assert_eq!(records.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod record;
mod redeemer;

pub use error::{RedeemError, RedeemResult};
pub use record::SealedRecord;
pub use redeemer::redeem;
