//! Poll scheduler: drives authenticate -> fetch -> decide -> notify cycles

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::decide::{self, NotifyReason};
use crate::io::HttpClient;
use crate::ledger::NotificationLedger;
use crate::notify::Notifier;
use crate::status::{current_epoch_ms, new_status_handle, StatusHandle};
use crate::{auth, fetch};

/// Config shared between the watcher and its collaborators
pub type SharedConfig = Arc<RwLock<Config>>;

/// Factory for per-cycle HTTP sessions. Every cycle re-authenticates on a
/// fresh cookie jar; nothing session-scoped survives the cycle.
pub type SessionFactory = Box<dyn Fn() -> Arc<dyn HttpClient> + Send + Sync>;

/// The watcher owns the poll loop and all state shared with it.
///
/// External triggers (the scheduled tick, a manual check, a config update)
/// all go through this handle. The ledger sits behind a mutex that is held
/// for the decide/notify/persist span of a cycle, so a manual check racing
/// the background loop cannot lose updates.
pub struct Watcher {
    inner: Arc<WatcherInner>,
}

struct WatcherInner {
    config: SharedConfig,
    ledger: Mutex<NotificationLedger>,
    state_path: PathBuf,
    sessions: SessionFactory,
    notifiers: Vec<Arc<dyn Notifier>>,
    status: StatusHandle,
    cancel: CancellationToken,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Watcher {
    /// Build a watcher from its collaborators. Loads the notification
    /// ledger from `state_path` immediately.
    pub fn new(
        config: SharedConfig,
        state_path: PathBuf,
        sessions: SessionFactory,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        let ledger = NotificationLedger::load(&state_path);
        Self {
            inner: Arc::new(WatcherInner {
                config,
                ledger: Mutex::new(ledger),
                state_path,
                sessions,
                notifiers,
                status: new_status_handle(),
                cancel: CancellationToken::new(),
                loop_task: Mutex::new(None),
            }),
        }
    }

    pub fn status_handle(&self) -> StatusHandle {
        Arc::clone(&self.inner.status)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Start the background poll loop. A second call while the loop is
    /// alive is a no-op.
    pub async fn start(&self) {
        let mut task = self.inner.loop_task.lock().await;
        if task.is_some() {
            tracing::debug!("Watcher already running; start ignored");
            return;
        }

        self.inner.status.write().await.running = true;
        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(async move { poll_loop(inner).await }));
        tracing::info!("Watcher started");
    }

    /// Cancel the loop, wait for it to wind down, and flush the ledger.
    ///
    /// The cancellation signal is set once; a stopped watcher stays
    /// stopped.
    pub async fn stop(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.loop_task.lock().await.take() {
            let _ = task.await;
        }

        let ledger = self.inner.ledger.lock().await;
        if let Err(e) = ledger.save(&self.inner.state_path) {
            tracing::warn!("Failed to flush notification ledger on stop: {}", e);
        }
        self.inner.status.write().await.running = false;
        tracing::info!("Watcher stopped");
    }

    /// Hot-swap the config used by the next cycle
    pub async fn update_config(&self, config: Config) {
        *self.inner.config.write().await = config;
        tracing::info!("Configuration updated");
    }

    /// Run one full cycle right now. Safe to call while the background
    /// loop runs; the two serialize on the ledger.
    pub async fn check_once(&self) -> crate::Result<()> {
        run_cycle(&self.inner).await
    }
}

async fn poll_loop(inner: Arc<WatcherInner>) {
    loop {
        if inner.cancel.is_cancelled() {
            break;
        }

        // Racing the cycle against cancellation drops in-flight HTTP on
        // shutdown instead of waiting out a slow remote.
        tokio::select! {
            result = run_cycle(&inner) => {
                if let Err(e) = result {
                    tracing::error!("Poll cycle failed: {}", e);
                }
            }
            _ = inner.cancel.cancelled() => break,
        }

        let interval = inner.config.read().await.effective_interval();
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = inner.cancel.cancelled() => {
                tracing::debug!("Poll loop cancelled during sleep");
                break;
            }
        }
    }
}

async fn run_cycle(inner: &WatcherInner) -> crate::Result<()> {
    let result = run_cycle_inner(inner).await;
    let ledger_entries = inner.ledger.lock().await.len();
    inner
        .status
        .write()
        .await
        .record_cycle(result.is_ok(), ledger_entries, current_epoch_ms());
    result
}

async fn run_cycle_inner(inner: &WatcherInner) -> crate::Result<()> {
    let config = inner.config.read().await.clone();
    if !config.is_valid() {
        tracing::warn!("Check requested but config is incomplete; skipping this cycle");
        return Ok(());
    }

    tracing::info!("Checking group instances...");
    let session = (inner.sessions)();
    auth::authenticate(session.as_ref(), &config).await?;
    let instances = fetch::fetch_group_instances(session.as_ref(), &config.group_id).await?;
    if instances.is_empty() {
        tracing::info!("No instances found.");
        return Ok(());
    }

    let mut ledger = inner.ledger.lock().await;
    let selected = decide::decide(&instances, &mut ledger, Utc::now());
    if selected.is_empty() {
        return Ok(());
    }

    for selection in &selected {
        let instance = &selection.instance;
        match selection.reason {
            NotifyReason::New => tracing::info!(
                "New instance: {} {} ({})",
                instance.id,
                instance.world_name,
                instance.instance_url
            ),
            NotifyReason::Stale => tracing::info!(
                "Re-notify instance after 4+ hours: {} {} ({})",
                instance.id,
                instance.world_name,
                instance.instance_url
            ),
        }

        // One notifier failing must not stop the others, and one
        // instance failing must not stop the next.
        for notifier in &inner.notifiers {
            if let Err(e) = notifier.notify(instance).await {
                tracing::warn!(
                    "{} notification for {} failed: {}",
                    notifier.kind(),
                    instance.id,
                    e
                );
            }
        }
    }

    if let Err(e) = ledger.save(&inner.state_path) {
        tracing::warn!("Failed to persist notification ledger: {}", e);
    }
    Ok(())
}
