//! Groupwatch - VRChat group instance watcher
//!
//! Polls a group's live instance list, notifies about new instances, and
//! re-notifies the single longest-unnotified known instance after four
//! hours. A durable notification ledger keeps re-notification idempotent
//! across restarts.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod decide;
pub mod error;
pub mod fetch;
pub mod io;
pub mod ledger;
pub mod logbuf;
pub mod model;
pub mod notify;
pub mod status;
pub mod totp;
pub mod watcher;
pub mod webhook;

pub use config::{load_config, Config};
pub use error::{Result, WatchError};
pub use watcher::{SessionFactory, SharedConfig, Watcher};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notify::{LocalAlertNotifier, Notifier};
use crate::webhook::DiscordWebhookNotifier;

/// Default ledger location, beside the running process
pub const DEFAULT_STATE_FILE: &str = "notified_instances.json";

/// Wire up a production watcher: a fresh reqwest session per cycle, local
/// alert plus Discord webhook notifiers sharing the hot-swappable config.
pub fn build_watcher(config: Config, state_path: PathBuf) -> Watcher {
    let config: SharedConfig = Arc::new(RwLock::new(config));
    let webhook_http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new_session());
    let notifiers: Vec<Arc<dyn Notifier>> = vec![
        Arc::new(LocalAlertNotifier),
        Arc::new(DiscordWebhookNotifier::new(
            Arc::clone(&config),
            webhook_http,
        )),
    ];
    let sessions: SessionFactory = Box::new(|| Arc::new(ReqwestHttpClient::new_session()));

    Watcher::new(config, state_path, sessions, notifiers)
}
