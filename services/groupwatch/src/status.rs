//! Shared watcher status for the dashboard

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::RwLock;

/// Snapshot of what the watcher has done so far
#[derive(Debug, Clone, Serialize)]
pub struct WatcherStatus {
    pub running: bool,
    pub cycles_completed: u64,
    pub last_cycle_epoch_ms: Option<u64>,
    pub last_cycle_ok: Option<bool>,
    pub ledger_entries: usize,
}

impl WatcherStatus {
    pub fn new() -> Self {
        Self {
            running: false,
            cycles_completed: 0,
            last_cycle_epoch_ms: None,
            last_cycle_ok: None,
            ledger_entries: 0,
        }
    }

    pub fn record_cycle(&mut self, ok: bool, ledger_entries: usize, now_ms: u64) {
        self.cycles_completed += 1;
        self.last_cycle_epoch_ms = Some(now_ms);
        self.last_cycle_ok = Some(ok);
        self.ledger_entries = ledger_entries;
    }
}

impl Default for WatcherStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared status handle
pub type StatusHandle = Arc<RwLock<WatcherStatus>>;

pub fn new_status_handle() -> StatusHandle {
    Arc::new(RwLock::new(WatcherStatus::new()))
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
