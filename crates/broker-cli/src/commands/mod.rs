//! One module per subcommand, mirroring the original source's
//! `cmd_init`/`cmd_issue`/`cmd_store_secret`/`cmd_redeem`/`cmd_health`
//! free functions.

pub mod health;
pub mod init;
pub mod issue;
pub mod redeem;
pub mod store;

/// Stubs seeded by default when no `--stubs` list is given, matching the
/// set of MCP servers this broker family ships capabilities for. Shared
/// by `issue` and `health`, both of which lazily seed a brand-new key
/// store with this list on first run.
pub(crate) const DEFAULT_STUBS: &[&str] = &[
    "github",
    "uno",
    "msftdocs",
    "playwright",
    "context7",
    "serena",
    "sequential-thinking",
    "fetch",
    "agent_copilot_cli",
    "agent_codex_cli",
    "agent_claude_cli",
];

pub(crate) fn default_stubs() -> Vec<String> {
    DEFAULT_STUBS.iter().map(|s| (*s).to_string()).collect()
}
