//! Broker Core - shared directory resolution, error types, and tunable
//! defaults for the capability broker crate family.
//!
//! This crate provides:
//! - Directory resolution for the broker state directory and capability tree
//! - A shared core error type
//! - Environment-overridable tunable defaults (rate limits, TTL, timeouts)
//! - Test fixtures shared by the other broker crates

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod atomic;
pub mod dirs;
pub mod error;
pub mod tunables;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use dirs::{BrokerHome, CapRoot};
pub use error::{CoreError, CoreResult};
