//! Prelude module - commonly used types for convenient import.
//!
//! Use `use broker_launcher::prelude::*;` to import the essentials.

pub use crate::error::{LaunchError, LaunchResult};
pub use crate::launch::{exec_resolved, resolve, ResolvedLaunch, STUB_SPEC_VAR};
pub use crate::selector::select_capability;
pub use crate::spec::{decode_stub_spec, StubSpec};
pub use crate::substitute::substitute;
