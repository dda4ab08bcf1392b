//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_capability::prelude::*;` to import the essentials.

pub use crate::error::{IssueError, IssueResult};
pub use crate::issuer::issue;
pub use crate::token::CapabilityToken;
