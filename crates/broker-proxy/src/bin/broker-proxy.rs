//! Standalone entry point for one proxy instance.
//!
//! Intended to be launched once per declared MCP stub, each bound to its
//! own loopback port and upstream target.

use std::time::Duration;

use broker_proxy::ProxyConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Threaded HTTP/1.1 + SSE reverse proxy for a single upstream MCP server.
#[derive(Debug, Parser)]
#[command(name = "broker-proxy", version, about)]
struct Args {
    /// Name reported on `/health` and injected as the `X-CA-Helper` header.
    #[arg(long)]
    name: String,

    /// Local address to listen on, e.g. `127.0.0.1:8080`.
    #[arg(long)]
    listen: String,

    /// Upstream base URL; only its host is ever contacted.
    #[arg(long)]
    target: String,

    /// Bearer token injected as `Authorization` when not already present.
    #[arg(long, env = "BROKER_PROXY_BEARER_TOKEN")]
    bearer_token: Option<String>,

    /// Per-request upstream timeout, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,broker_proxy=info")),
        )
        .init();
}

fn run() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let config = ProxyConfig::new(
        args.name,
        args.listen,
        &args.target,
        args.bearer_token,
        Duration::from_secs(args.timeout),
    )?;

    broker_proxy::run(config)?;
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("broker-proxy: {err}");
        std::process::exit(1);
    }
}
