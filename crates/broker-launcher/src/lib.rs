//! Broker Launcher - the in-container stub launcher (C4).
//!
//! Invoked with a single environment variable, [`launch::STUB_SPEC_VAR`]
//! (base64-encoded JSON of a [`StubSpec`]), and an optional `CAP_ROOT`
//! pointing at the capability directory tree. Selects the freshest valid
//! capability for the stub, decrypts its declared secrets, substitutes
//! `${NAME}`/`$NAME` placeholders, and replaces its own process image with
//! the real target command via [`launch::exec_resolved`].
//!
//! The launcher MUST NOT write plaintext secrets to disk, log, or
//! network, and MUST NOT emit them to its own stderr — substitution into
//! the child's argv/env is the only channel by which plaintext reaches
//! the child. Every `tracing` call in this crate's pre-exec path logs
//! only stub names, capability IDs, and secret *names*.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod launch;
mod selector;
mod spec;
mod substitute;

pub use error::{LaunchError, LaunchResult};
pub use launch::{exec_resolved, resolve, ResolvedLaunch, STUB_SPEC_VAR};
pub use selector::select_capability;
pub use spec::{decode_stub_spec, StubSpec};
pub use substitute::substitute;
