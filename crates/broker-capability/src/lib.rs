//! Broker Capability - rate-limited issuance of capability tokens (C2).
//!
//! A capability token binds a stub, a caller-supplied session identifier,
//! and a fresh nonce into an HMAC-SHA256 signature keyed by the stub's
//! broker key, plus a second HMAC used only as a sealing key. See
//! [`CapabilityToken`] for the exact fields and [`issue`] for the
//! issuance operation.
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
//!
//! let tokens = broker_capability::issue(
//!     &mut store,
//!     &fixture.cap_root,
//!     "session-1",
//!     &["github".to_string()],
//!     10,
//! )?;
//! assert_eq!(tokens.len(), 1);
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
mod issuer;
mod token;

pub use error::{IssueError, IssueResult};
pub use issuer::issue;
pub use token::CapabilityToken;
