//! Capability selection: pick the freshest valid capability token for a
//! stub out of `<CAP_ROOT>/<stub>/*.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use broker_capability::CapabilityToken;
use broker_core::CapRoot;
use chrono::Utc;

use crate::error::{LaunchError, LaunchResult};

fn file_mtime(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn qualifies(token: &CapabilityToken, stub: &str) -> bool {
    token.stub == stub && token.is_live_at(Utc::now()) && !token.session_key.is_empty()
}

/// Select the freshest (by file modification time, descending) capability
/// token under `<cap_root>/<stub>` that matches `stub`, is unexpired, and
/// carries a non-empty `session_key`.
///
/// # Errors
///
/// Returns [`LaunchError::NoCapabilityDirectory`] if the stub directory
/// does not exist, or [`LaunchError::NoValidCapability`] if no candidate
/// file qualifies.
pub fn select_capability(cap_root: &CapRoot, stub: &str) -> LaunchResult<(PathBuf, CapabilityToken)> {
    let dir = cap_root.stub_dir(stub);
    if !dir.is_dir() {
        return Err(LaunchError::NoCapabilityDirectory {
            stub: stub.to_string(),
        });
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    candidates.sort_by_key(|path| std::cmp::Reverse(file_mtime(path)));

    for path in candidates {
        let Ok(raw) = fs::read_to_string(&path) else {
            continue;
        };
        let Ok(token) = serde_json::from_str::<CapabilityToken>(&raw) else {
            continue;
        };
        if qualifies(&token, stub) {
            return Ok((path, token));
        }
    }

    Err(LaunchError::NoValidCapability {
        stub: stub.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::atomic::write_json_sorted;
    use broker_core::testutil::BrokerFixture;
    use broker_store::BrokerStore;
    use std::thread::sleep;
    use std::time::Duration;

    fn issue_token(store: &mut BrokerStore, cap_root: &CapRoot, stub: &str, ttl: i64) -> PathBuf {
        let tokens = broker_capability::issue(store, cap_root, "sess", &[stub.to_string()], ttl)
            .unwrap();
        cap_root
            .stub_dir(stub)
            .join(format!("{}.json", tokens[0].capability_id))
    }

    #[test]
    fn missing_directory_is_an_error() {
        let fixture = BrokerFixture::new();
        let err = select_capability(&fixture.cap_root, "nope").unwrap_err();
        assert!(matches!(err, LaunchError::NoCapabilityDirectory { .. }));
    }

    #[test]
    fn selects_the_freshest_valid_capability() {
        let fixture = BrokerFixture::new();
        let mut store = BrokerStore::open(fixture.home.clone()).unwrap();
        store.init(&["svc".to_string()]).unwrap();

        let first = issue_token(&mut store, &fixture.cap_root, "svc", 10);
        sleep(Duration::from_millis(10));
        let second = issue_token(&mut store, &fixture.cap_root, "svc", 10);

        let (selected_path, _token) = select_capability(&fixture.cap_root, "svc").unwrap();
        assert_eq!(selected_path, second);
        assert_ne!(selected_path, first);
    }

    #[test]
    fn skips_expired_capabilities() {
        let fixture = BrokerFixture::new();
        let mut store = BrokerStore::open(fixture.home.clone()).unwrap();
        store.init(&["svc".to_string()]).unwrap();

        let expired_path = issue_token(&mut store, &fixture.cap_root, "svc", -10);
        let raw = fs::read_to_string(&expired_path).unwrap();
        let mut token: CapabilityToken = serde_json::from_str(&raw).unwrap();
        token.expires_at = Utc::now() - chrono::Duration::minutes(1);
        write_json_sorted(&expired_path, &token).unwrap();

        let err = select_capability(&fixture.cap_root, "svc").unwrap_err();
        assert!(matches!(err, LaunchError::NoValidCapability { .. }));
    }
}
