//! Resolve a stub spec against a selected capability's decrypted secrets,
//! then replace the current process image with the real target command.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::ffi::CString;
use std::fs;

use broker_core::CapRoot;
use broker_redeem::SealedRecord;

use crate::error::{LaunchError, LaunchResult};
use crate::selector::select_capability;
use crate::spec::StubSpec;
use crate::substitute::substitute;

/// Environment variable carrying the base64(JSON) stub spec. Removed from
/// the child's environment before exec.
pub const STUB_SPEC_VAR: &str = "STUB_SPEC";

/// A stub spec fully resolved against a selected capability's decrypted
/// secrets: ready to hand to [`exec_resolved`].
#[derive(Debug, Clone)]
pub struct ResolvedLaunch {
    /// The command to exec.
    pub command: String,
    /// Resolved argument list.
    pub args: Vec<String>,
    /// The full child environment (inherited process env, minus
    /// [`STUB_SPEC_VAR`], with resolved overrides merged in).
    pub env: BTreeMap<String, String>,
    /// Resolved working directory, if any.
    pub cwd: Option<String>,
}

fn unseal_declared_secrets(
    cap_root: &CapRoot,
    stub: &str,
    capability_id: &str,
    session_key: &str,
    names: &[String],
) -> LaunchResult<BTreeMap<String, String>> {
    let secrets_dir = cap_root.secrets_dir(stub);
    let mut decrypted = BTreeMap::new();
    for name in names {
        let path = secrets_dir.join(format!("{name}.sealed"));
        let raw = fs::read_to_string(&path)?;
        let record: SealedRecord =
            serde_json::from_str(&raw).map_err(|e| LaunchError::BadSpec(e.to_string()))?;
        if !record.matches(stub, capability_id) {
            return Err(LaunchError::SealedRecordMismatch { name: name.clone() });
        }
        let plaintext = broker_crypto::cipher::unseal(session_key, &record.ciphertext)?;
        decrypted.insert(name.clone(), plaintext);
    }
    Ok(decrypted)
}

/// Select a capability for `spec.stub`, decrypt its declared secrets,
/// substitute placeholders, and build the final child environment.
///
/// # Errors
///
/// Returns a [`LaunchError`] if no capability qualifies, a sealed record
/// is missing or mismatched, or the resolved command is empty.
pub fn resolve(spec: &StubSpec, cap_root: &CapRoot) -> LaunchResult<ResolvedLaunch> {
    let (_path, token) = select_capability(cap_root, &spec.stub)?;

    let secrets = unseal_declared_secrets(
        cap_root,
        &spec.stub,
        &token.capability_id,
        &token.session_key,
        &spec.secrets,
    )?;

    let command = substitute(&spec.command, &secrets);
    if command.is_empty() {
        return Err(LaunchError::EmptyCommand);
    }
    let args = spec.args.iter().map(|a| substitute(a, &secrets)).collect();
    let cwd = spec.cwd.as_ref().map(|c| substitute(c, &secrets));

    let mut env: BTreeMap<String, String> = std::env::vars().collect();
    env.remove(STUB_SPEC_VAR);
    for (key, value) in &spec.env {
        env.insert(key.clone(), substitute(value, &secrets));
    }

    tracing::info!(
        stub = %spec.stub,
        capability_id = %token.capability_id,
        secret_names = ?spec.secrets,
        "resolved stub spec"
    );

    Ok(ResolvedLaunch {
        command,
        args,
        env,
        cwd,
    })
}

/// Change into `resolved.cwd` (if set) and replace the current process
/// image with `resolved.command` + `resolved.args`, inheriting
/// `resolved.env`. Never returns on success.
///
/// # Errors
///
/// Returns [`LaunchError::Io`] if `cwd` cannot be entered, or
/// [`LaunchError::Exec`] if `execvpe` itself fails.
pub fn exec_resolved(resolved: ResolvedLaunch) -> LaunchResult<Infallible> {
    if let Some(cwd) = resolved.cwd.filter(|c| !c.is_empty()) {
        std::env::set_current_dir(&cwd)?;
    }

    let command =
        CString::new(resolved.command).map_err(|e| LaunchError::Exec(e.to_string()))?;
    let mut argv = vec![command.clone()];
    for arg in resolved.args {
        argv.push(CString::new(arg).map_err(|e| LaunchError::Exec(e.to_string()))?);
    }
    let envp: Vec<CString> = resolved
        .env
        .into_iter()
        .map(|(k, v)| CString::new(format!("{k}={v}")).map_err(|e| LaunchError::Exec(e.to_string())))
        .collect::<LaunchResult<_>>()?;

    match nix::unistd::execvpe(&command, &argv, &envp) {
        Ok(never) => match never {},
        Err(errno) => Err(LaunchError::Exec(errno.to_string())),
    }
}
