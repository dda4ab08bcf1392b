//! Atomic, owner-only JSON persistence shared by every store file the
//! protocol writes: `keys.json`/`secrets.json`/`state.json` under
//! [`crate::BrokerHome`], and the capability token / sealed secret record
//! files under [`crate::CapRoot`].
//!
//! Every write goes through the same write-temp-then-rename-then-chmod
//! sequence so a concurrent reader always observes either the old or the
//! new content, never a partial write, matching §4.1 of the protocol.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

/// Recursively re-key JSON objects into sorted (`BTreeMap`) order so the
/// emitted file matches the protocol's canonical "sorted keys" requirement
/// for capability tokens and sealed records.
fn sort_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_value(v))).collect();
            serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serializes")
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

/// Render `value` as pretty-printed JSON with object keys in sorted order.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn sorted_json_string(value: &impl Serialize) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&sort_value(value))
}

/// Write `bytes` to `path` via a same-directory temp file and rename, then
/// restrict the result to owner read/write (`0600`).
///
/// # Errors
///
/// Returns an error if the temp file cannot be written, the rename fails,
/// or (on unix) the permission change fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    chmod_owner_rw(path)
}

/// Serialize `value` as sorted-key JSON and write it atomically to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn write_json_sorted(path: &Path, value: &impl Serialize) -> io::Result<()> {
    let json = sorted_json_string(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

#[cfg(unix)]
fn chmod_owner_rw(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn chmod_owner_rw(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Best-effort attempt to mark `path` immutable via the platform's `chattr
/// +i` (Linux `ext*`/`btrfs` extended attribute). Never fatal: filesystems
/// that don't support the attribute (tmpfs, overlayfs, non-Linux) simply log
/// at `debug` and continue, matching the original source's framing of this
/// as a defense-in-depth nicety rather than a protocol invariant.
#[cfg(target_os = "linux")]
pub fn try_lock_immutable(path: &Path) {
    use std::process::Command;

    match Command::new("chattr")
        .arg("+i")
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {
            tracing::debug!(path = %path.display(), "marked store file immutable");
        }
        Ok(status) => {
            tracing::debug!(path = %path.display(), code = ?status.code(), "chattr +i did not succeed, continuing");
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "chattr unavailable, continuing");
        }
    }
}

/// No-op on non-Linux platforms: there is no portable immutable-attribute
/// equivalent, so the tunable is simply inert there.
#[cfg(not(target_os = "linux"))]
pub fn try_lock_immutable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Example {
        zeta: &'static str,
        alpha: &'static str,
        nested: Nested,
    }

    #[derive(Serialize)]
    struct Nested {
        b: u8,
        a: u8,
    }

    #[test]
    fn sorted_json_string_orders_keys() {
        let value = Example {
            zeta: "z",
            alpha: "a",
            nested: Nested { b: 2, a: 1 },
        };
        let json = sorted_json_string(&value).unwrap();
        let alpha_pos = json.find("\"alpha\"").unwrap();
        let zeta_pos = json.find("\"zeta\"").unwrap();
        assert!(alpha_pos < zeta_pos);
        let a_pos = json.find("\"a\"").unwrap();
        let b_pos = json.find("\"b\"").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn write_atomic_creates_file_with_owner_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn write_atomic_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn write_json_sorted_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let value = Example {
            zeta: "z",
            alpha: "a",
            nested: Nested { b: 2, a: 1 },
        };
        write_json_sorted(&path, &value).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["alpha"], "a");
        assert_eq!(parsed["nested"]["b"], 2);
    }
}
