//! The stub spec: the caller-supplied description of the real MCP command
//! a stub should `exec`, carried base64-encoded in `STUB_SPEC`.

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, LaunchResult};

/// One MCP server invocation, as decoded from `STUB_SPEC`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubSpec {
    /// Stub identity; must match a capability directory name.
    pub stub: String,
    /// Absolute path of the real target binary.
    pub command: String,
    /// Ordered argument list.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables to set (after placeholder substitution,
    /// these override the inherited process environment).
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Optional working directory for the child process.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Secret names this stub depends on.
    #[serde(default)]
    pub secrets: Vec<String>,
}

/// The wire shape of a stub spec before env-value validation: `env`
/// accepts arbitrary JSON so a compound value can be detected and
/// reported as [`LaunchError::CompoundEnvValue`] instead of surfacing as
/// an opaque serde type-mismatch message.
#[derive(Debug, Deserialize)]
struct RawStubSpec {
    #[serde(default)]
    stub: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    secrets: Vec<String>,
}

/// Decode and parse a base64(JSON) `STUB_SPEC` value.
///
/// # Errors
///
/// Returns [`LaunchError::BadSpec`] if the value is not valid base64, not
/// valid JSON, or missing `stub` or `command`; returns
/// [`LaunchError::CompoundEnvValue`] if an `env` entry is not a scalar
/// string.
pub fn decode_stub_spec(encoded: &str) -> LaunchResult<StubSpec> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| LaunchError::BadSpec(format!("not valid base64: {e}")))?;
    let json = String::from_utf8(raw)
        .map_err(|e| LaunchError::BadSpec(format!("stub spec is not valid UTF-8: {e}")))?;
    let raw_spec: RawStubSpec =
        serde_json::from_str(&json).map_err(|e| LaunchError::BadSpec(e.to_string()))?;

    if raw_spec.stub.is_empty() {
        return Err(LaunchError::BadSpec("missing 'stub'".to_string()));
    }
    if raw_spec.command.is_empty() {
        return Err(LaunchError::BadSpec("missing 'command'".to_string()));
    }

    let mut env = BTreeMap::new();
    for (name, value) in raw_spec.env {
        match value {
            serde_json::Value::String(s) => {
                env.insert(name, s);
            }
            _ => return Err(LaunchError::CompoundEnvValue { name }),
        }
    }

    Ok(StubSpec {
        stub: raw_spec.stub,
        command: raw_spec.command,
        args: raw_spec.args,
        env,
        cwd: raw_spec.cwd,
        secrets: raw_spec.secrets,
    })
}
