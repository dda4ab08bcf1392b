//! Issuance history and used-capability ledger (`state.json`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use broker_core::atomic::write_json_sorted;

use crate::error::StoreResult;

/// Issuance rate-limit history plus the replay-protection ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateStore {
    /// Wall-clock (unix seconds) timestamps of recent issuances, used only
    /// for the sliding-window rate limit.
    #[serde(default)]
    issue_timestamps: Vec<f64>,

    /// `capability_id -> ISO-8601 redemption timestamp`, for replay
    /// rejection. Entries older than the retention window may be evicted.
    #[serde(default)]
    used_capabilities: BTreeMap<String, String>,

    /// Unix timestamp of the most recent issuance, for `health` reporting.
    #[serde(default)]
    last_issue: Option<f64>,
}

impl StateStore {
    /// Load state from `path`. A missing file is empty state; a corrupt
    /// file is recovered as empty state (logged, not fatal) — only the key
    /// store treats corruption as fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` exists but cannot be read.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(err) => {
                tracing::warn!(error = %err, "state.json is corrupt, recovering as empty state");
                Ok(Self::default())
            }
        }
    }

    /// Persist state to `path` (sorted keys, mode `0600`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        write_json_sorted(path, self)?;
        Ok(())
    }

    /// Expire issuance timestamps older than `window` and, if the
    /// remaining count is below `limit`, record `now` as a fresh issuance
    /// and return `true`. If the window is already at `limit`, the
    /// timestamp list is still pruned but `now` is not appended and `false`
    /// is returned — matching the original source, which never counts a
    /// rejected issuance attempt against the window.
    pub fn check_and_record_issuance(&mut self, window: Duration, limit: usize, now: f64) -> bool {
        let window_secs = window.as_secs_f64();
        self.issue_timestamps.retain(|&ts| now - ts <= window_secs);
        if self.issue_timestamps.len() >= limit {
            return false;
        }
        self.issue_timestamps.push(now);
        self.last_issue = Some(now);
        true
    }

    /// Number of timestamps retained after the most recent prune.
    #[must_use]
    pub fn issue_timestamp_count(&self) -> usize {
        self.issue_timestamps.len()
    }

    /// Timestamp of the most recent issuance, if any.
    #[must_use]
    pub fn last_issue(&self) -> Option<f64> {
        self.last_issue
    }

    /// Whether `capability_id` is already present in the used-capability
    /// ledger (i.e. would be a replay).
    #[must_use]
    pub fn is_used(&self, capability_id: &str) -> bool {
        self.used_capabilities.contains_key(capability_id)
    }

    /// Record `capability_id` as redeemed at `now`, then evict ledger
    /// entries older than `retention`.
    pub fn mark_used(&mut self, capability_id: &str, now: DateTime<Utc>, retention: Duration) {
        self.used_capabilities
            .insert(capability_id.to_string(), now.to_rfc3339());
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero());
        let cutoff = now - retention;
        self.used_capabilities.retain(|_, ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|parsed| parsed.with_timezone(&Utc) >= cutoff)
                .unwrap_or(true)
        });
    }

    /// Number of entries currently in the used-capability ledger.
    #[must_use]
    pub fn used_capability_count(&self) -> usize {
        self.used_capabilities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_allows_up_to_limit() {
        let mut state = StateStore::default();
        let window = Duration::from_secs(60);
        assert!(state.check_and_record_issuance(window, 3, 1000.0));
        assert!(state.check_and_record_issuance(window, 3, 1000.1));
        assert!(state.check_and_record_issuance(window, 3, 1000.2));
        assert!(!state.check_and_record_issuance(window, 3, 1000.3));
        assert_eq!(state.issue_timestamp_count(), 3);
    }

    #[test]
    fn rate_limit_expires_old_entries() {
        let mut state = StateStore::default();
        let window = Duration::from_secs(60);
        assert!(state.check_and_record_issuance(window, 1, 1000.0));
        assert!(!state.check_and_record_issuance(window, 1, 1000.1));
        // Far enough in the future that the first entry has expired.
        assert!(state.check_and_record_issuance(window, 1, 1100.0));
        assert_eq!(state.issue_timestamp_count(), 1);
    }

    #[test]
    fn replay_tracking() {
        let mut state = StateStore::default();
        assert!(!state.is_used("cap-1"));
        state.mark_used("cap-1", Utc::now(), Duration::from_secs(24 * 60 * 60));
        assert!(state.is_used("cap-1"));
        assert_eq!(state.used_capability_count(), 1);
    }

    #[test]
    fn mark_used_evicts_old_entries() {
        let mut state = StateStore::default();
        let old = Utc::now() - chrono::Duration::hours(25);
        state.mark_used("old-cap", old, Duration::from_secs(24 * 60 * 60));
        state.mark_used("new-cap", Utc::now(), Duration::from_secs(24 * 60 * 60));
        assert!(!state.is_used("old-cap"));
        assert!(state.is_used("new-cap"));
    }

    #[test]
    fn round_trip_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = StateStore::default();
        state.check_and_record_issuance(Duration::from_secs(60), 30, 42.0);
        state.mark_used("cap-1", Utc::now(), Duration::from_secs(24 * 60 * 60));
        state.save(&path).unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert_eq!(reloaded.issue_timestamp_count(), 1);
        assert!(reloaded.is_used("cap-1"));
        assert_eq!(reloaded.last_issue(), Some(42.0));
    }

    #[test]
    fn corrupt_state_recovers_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        let state = StateStore::load(&path).unwrap();
        assert_eq!(state.issue_timestamp_count(), 0);
    }
}
