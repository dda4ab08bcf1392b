//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_redeem::prelude::*;` to import the essentials.

pub use crate::error::{RedeemError, RedeemResult};
pub use crate::record::SealedRecord;
pub use crate::redeemer::redeem;
