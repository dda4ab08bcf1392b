//! Host-side secret broker CLI.
//!
//! Thin glue over `broker-store`/`broker-capability`/`broker-redeem`:
//! `init` seeds broker keys, `issue` mints capability tokens, `store` saves
//! a plaintext secret, `redeem` validates a capability and seals its
//! secrets, `health` reports broker store status.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod commands;

use std::path::PathBuf;

use broker_core::tunables::DEFAULT_TTL_MINUTES;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::default_stubs;
use commands::store::ValueSource;

/// Host-side secret broker: issue and redeem short-lived capability tokens.
#[derive(Parser)]
#[command(name = "broker-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate broker keys for the given stubs (idempotent).
    Init {
        /// Stub names to ensure keys for.
        #[arg(long, num_args = 0.., default_values_t = default_stubs())]
        stubs: Vec<String>,
    },

    /// Issue capability tokens for a session.
    Issue {
        /// Opaque session identifier bound into every issued token.
        #[arg(long)]
        session_id: String,

        /// Directory to write `<stub>/<capability_id>.json` tokens into.
        #[arg(long)]
        output: PathBuf,

        /// Stubs to issue capabilities for.
        #[arg(long, num_args = 1.., default_values_t = default_stubs())]
        stubs: Vec<String>,

        /// Capability lifetime, in minutes.
        #[arg(long, default_value_t = DEFAULT_TTL_MINUTES)]
        ttl: i64,
    },

    /// Store or update a plaintext secret value for a stub.
    Store {
        /// Stub the secret belongs to.
        #[arg(long)]
        stub: String,

        /// Secret name, referenced by stub specs as `${NAME}`.
        #[arg(long)]
        name: String,

        #[command(flatten)]
        value: StoreValueArgs,
    },

    /// Validate a capability token and seal the requested secrets.
    Redeem {
        /// Path to the capability token JSON file.
        #[arg(long)]
        capability: PathBuf,

        /// Secret name to seal; may be repeated.
        #[arg(long = "secret", required = true)]
        secrets: Vec<String>,

        /// Directory to write `<name>.sealed` records into (default:
        /// `<capability's directory>/secrets`).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Allow redeeming an already-used capability.
        #[arg(long)]
        allow_reuse: bool,
    },

    /// Report broker store health.
    Health,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct StoreValueArgs {
    /// Literal secret value.
    #[arg(long)]
    value: Option<String>,

    /// Read the secret value from this environment variable.
    #[arg(long)]
    from_env: Option<String>,

    /// Read the secret value from this file (trailing newline stripped).
    #[arg(long)]
    from_file: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,broker_cli=info")),
        )
        .init();
}

fn run() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Init { stubs } => commands::init::run(&stubs),
        Command::Issue {
            session_id,
            output,
            stubs,
            ttl,
        } => commands::issue::run(&session_id, &stubs, &output, ttl),
        Command::Store { stub, name, value } => {
            let source = match (value.value, value.from_env, value.from_file) {
                (Some(literal), None, None) => ValueSource::Literal(literal),
                (None, Some(var), None) => ValueSource::Env(var),
                (None, None, Some(path)) => ValueSource::File(path),
                _ => unreachable!("clap's mutually-exclusive group enforces exactly one source"),
            };
            commands::store::run(&stub, &name, source)
        }
        Command::Redeem {
            capability,
            secrets,
            output_dir,
            allow_reuse,
        } => commands::redeem::run(&capability, &secrets, output_dir.as_deref(), allow_reuse),
        Command::Health => commands::health::run(),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("broker-cli: {err}");
        std::process::exit(1);
    }
}
