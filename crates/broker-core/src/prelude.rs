//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_core::prelude::*;` to import all essential types.

pub use crate::atomic::{sorted_json_string, try_lock_immutable, write_atomic, write_json_sorted};
pub use crate::dirs::{BrokerHome, CapRoot};
pub use crate::error::{CoreError, CoreResult};
pub use crate::tunables::{self, RateLimit};
