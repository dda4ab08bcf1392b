//! Broker Proxy - the threaded HTTP/1.1 + SSE reverse proxy (C5).
//!
//! Each [`ProxyConfig`] describes one localhost forwarder for a single
//! remote MCP server: a `listen` address, a `target` upstream base URL
//! whose host is the only destination ever contacted, an optional bearer
//! token, and a per-request timeout. [`run`] binds the listener and
//! dispatches one worker thread per inbound connection via `tiny_http`.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use broker_proxy::ProxyConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::new(
//!     "github".to_string(),
//!     "127.0.0.1:8080".to_string(),
//!     "https://api.github.com",
//!     Some("ghp_example".to_string()),
//!     Duration::from_secs(60),
//! )?;
//! broker_proxy::run(config)?;
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

pub mod config;
pub mod error;
mod headers;
mod server;

pub use config::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use server::run;
