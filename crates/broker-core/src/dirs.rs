//! Directory resolution for the broker state directory and capability tree.
//!
//! Two directory roots drive the protocol:
//!
//! - [`BrokerHome`]: the host-side broker state directory (`$BROKER_DIR`, or
//!   `~/.config/containai/broker` by default). Holds `keys.json`,
//!   `secrets.json`, and `state.json` — never mounted into a container.
//!
//! - [`CapRoot`]: the capability output tree (`$CAP_ROOT`, or
//!   `~/.config/containai/capabilities` by default). Holds per-stub capability
//!   tokens and sealed secret records; mounted read-only into the container
//!   the stub launcher runs in.
//!
//! # Layout
//!
//! ```text
//! BROKER_DIR/
//! ├── keys.json       stub -> hex broker key                 (0600)
//! ├── secrets.json    stub -> { name -> plaintext }           (0600)
//! └── state.json      issue timestamps + used-capability ledger (0600)
//!
//! CAP_ROOT/
//! └── <stub>/
//!     ├── <capability_id>.json   capability token             (0600)
//!     └── secrets/
//!         └── <secret_name>.sealed   sealed record             (0600)
//! ```

use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

fn default_project_dirs() -> io::Result<ProjectDirs> {
    ProjectDirs::from("", "containai", "containai").ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "could not determine a home directory for the current user",
        )
    })
}

fn resolve_root(env_var: &str, default: impl FnOnce() -> io::Result<PathBuf>) -> io::Result<PathBuf> {
    match std::env::var(env_var) {
        Ok(custom) => {
            let path = PathBuf::from(&custom);
            if !path.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{env_var} must be an absolute path, got {custom:?}"),
                ));
            }
            Ok(path)
        }
        Err(_) => default(),
    }
}

#[cfg(unix)]
fn chmod_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn chmod_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// The host-side broker state directory.
#[derive(Debug, Clone)]
pub struct BrokerHome {
    root: PathBuf,
}

impl BrokerHome {
    /// Resolve the broker home directory.
    ///
    /// Checks `$BROKER_DIR` first (must be absolute); falls back to
    /// `~/.config/containai/broker`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$BROKER_DIR` is set but not absolute, or if no
    /// home directory can be determined for the fallback.
    pub fn resolve() -> io::Result<Self> {
        let root = resolve_root("BROKER_DIR", || {
            Ok(default_project_dirs()?.config_dir().join("broker"))
        })?;
        Ok(Self { root })
    }

    /// Construct from an explicit path (used in tests).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if missing and restrict it to owner access.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        chmod_owner_only(&self.root)
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the key store (`keys.json`).
    #[must_use]
    pub fn keys_path(&self) -> PathBuf {
        self.root.join("keys.json")
    }

    /// Path to the secret store (`secrets.json`).
    #[must_use]
    pub fn secrets_path(&self) -> PathBuf {
        self.root.join("secrets.json")
    }

    /// Path to the issuance/ledger state store (`state.json`).
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }
}

/// The capability output tree mounted into the container.
#[derive(Debug, Clone)]
pub struct CapRoot {
    root: PathBuf,
}

impl CapRoot {
    /// Resolve the capability root directory.
    ///
    /// Checks `$CAP_ROOT` first (must be absolute); falls back to
    /// `~/.config/containai/capabilities`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$CAP_ROOT` is set but not absolute, or if no
    /// home directory can be determined for the fallback.
    pub fn resolve() -> io::Result<Self> {
        let root = resolve_root("CAP_ROOT", || {
            Ok(default_project_dirs()?.config_dir().join("capabilities"))
        })?;
        Ok(Self { root })
    }

    /// Construct from an explicit path (used in tests and by the launcher
    /// when `CAP_ROOT` is supplied directly rather than through the
    /// environment).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-stub capability directory (`CAP_ROOT/<stub>`).
    #[must_use]
    pub fn stub_dir(&self, stub: &str) -> PathBuf {
        self.root.join(stub)
    }

    /// Per-stub sealed-secrets directory (`CAP_ROOT/<stub>/secrets`).
    #[must_use]
    pub fn secrets_dir(&self, stub: &str) -> PathBuf {
        self.stub_dir(stub).join("secrets")
    }

    /// Create `CAP_ROOT/<stub>` (and its `secrets/` subdirectory) if missing,
    /// restricted to owner access.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure_stub(&self, stub: &str) -> io::Result<()> {
        let secrets = self.secrets_dir(stub);
        std::fs::create_dir_all(&secrets)?;
        chmod_owner_only(&self.stub_dir(stub))?;
        chmod_owner_only(&secrets)
    }
}
