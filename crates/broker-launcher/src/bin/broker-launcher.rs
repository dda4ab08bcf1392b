//! In-container stub launcher binary.
//!
//! Reads `STUB_SPEC` (base64-encoded JSON), `CAP_ROOT` (optional), selects
//! a capability, decrypts secrets, and `exec`s the real target command.
//! Never returns on success.

use broker_core::CapRoot;
use broker_launcher::{decode_stub_spec, exec_resolved, resolve, STUB_SPEC_VAR};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,broker_launcher=info")),
        )
        .init();
}

fn run() -> anyhow::Result<()> {
    init_logging();

    let encoded = std::env::var(STUB_SPEC_VAR)
        .map_err(|_| anyhow::anyhow!("{STUB_SPEC_VAR} is not set"))?;
    let spec = decode_stub_spec(&encoded)?;

    let cap_root = CapRoot::resolve()?;
    let resolved = resolve(&spec, &cap_root)?;

    exec_resolved(resolved)?;
    unreachable!("exec_resolved only returns on error");
}

fn main() {
    if let Err(err) = run() {
        eprintln!("broker-launcher: {err}");
        std::process::exit(1);
    }
}
