//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_proxy::prelude::*;` to import the essentials.

pub use crate::config::ProxyConfig;
pub use crate::error::{ProxyError, ProxyResult};
pub use crate::run;
