//! Durable ledger of instance id -> last-notified time

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mapping of instance id to the last time it was notified.
///
/// An id is present iff the instance has been notified at least once since
/// the ledger was last cleared. Entries are never evicted, even when the
/// instance drops off the live list: a stale entry only participates in the
/// re-notify comparison and stops mattering once the instance is gone for
/// good. Growth is bounded by the group's instance-id churn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLedger {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger from disk. A missing or unreadable file yields an
    /// empty ledger; the watcher always starts.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No notification ledger at {:?}; starting empty", path);
            return Self::new();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<BTreeMap<String, DateTime<Utc>>>(&content)
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(entries) => {
                let mut ledger = Self::new();
                for (id, last_notified) in entries {
                    if id.trim().is_empty() {
                        continue;
                    }
                    ledger.entries.insert(id, last_notified);
                }
                tracing::info!(
                    "Loaded {} notified instances from {:?}",
                    ledger.len(),
                    path
                );
                ledger
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load notification ledger from {:?}: {}; starting empty",
                    path,
                    e
                );
                Self::new()
            }
        }
    }

    /// Persist the ledger. Failures are reported to the caller, which keeps
    /// the in-memory state for the next attempt.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    crate::WatchError::Persistence(format!(
                        "Failed to create {:?}: {}",
                        dir, e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json).map_err(|e| {
            crate::WatchError::Persistence(format!("Failed to write {:?}: {}", path, e))
        })?;
        tracing::info!("Saved {} notified instances to {:?}", self.len(), path);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn last_notified(&self, id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    pub fn mark_notified(&mut self, id: &str, at: DateTime<Utc>) {
        self.entries.insert(id.to_string(), at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn mark_and_lookup() {
        let mut ledger = NotificationLedger::new();
        assert!(!ledger.contains("i1"));

        ledger.mark_notified("i1", ts(10));
        assert!(ledger.contains("i1"));
        assert_eq!(ledger.last_notified("i1"), Some(ts(10)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn mark_overwrites_previous_time() {
        let mut ledger = NotificationLedger::new();
        ledger.mark_notified("i1", ts(10));
        ledger.mark_notified("i1", ts(12));
        assert_eq!(ledger.last_notified("i1"), Some(ts(12)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notified_instances.json");

        let mut ledger = NotificationLedger::new();
        ledger.mark_notified("i1", ts(10));
        ledger.mark_notified("i2", ts(11));
        ledger.save(&path).unwrap();

        let reloaded = NotificationLedger::load(&path);
        assert_eq!(reloaded, ledger);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = NotificationLedger::load(&dir.path().join("absent.json"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notified_instances.json");
        std::fs::write(&path, "not json").unwrap();

        let ledger = NotificationLedger::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn load_skips_blank_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notified_instances.json");
        std::fs::write(
            &path,
            r#"{"": "2024-06-01T10:00:00Z", "  ": "2024-06-01T10:00:00Z", "i1": "2024-06-01T10:00:00Z"}"#,
        )
        .unwrap();

        let ledger = NotificationLedger::load(&path);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains("i1"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("notified_instances.json");

        let mut ledger = NotificationLedger::new();
        ledger.mark_notified("i1", ts(10));
        ledger.save(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn save_to_unwritable_path_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the write fail
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        let mut ledger = NotificationLedger::new();
        ledger.mark_notified("i1", ts(10));
        let err = ledger.save(&path).unwrap_err();
        match err {
            crate::WatchError::Persistence(msg) => assert!(msg.contains("Failed to write")),
            other => panic!("expected WatchError::Persistence, got {other:?}"),
        }
    }
}
