//! Groupwatch CLI
//!
//! Command-line interface for the VRChat group instance watcher.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use groupwatch::logbuf::LogBuffer;
use groupwatch::{build_watcher, dashboard, load_config, DEFAULT_STATE_FILE};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Parser)]
#[command(name = "groupwatch")]
#[command(about = "VRChat group instance watcher and notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the notification ledger (overrides config file)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Run a single check cycle and exit
    #[arg(long)]
    check_once: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let logs = LogBuffer::new();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(LevelFilter::from_level(args.log_level)),
        )
        .with(logs.layer())
        .init();

    let mut config = load_config(&args.config)?;
    config.resolve_secrets()?;
    if let Some(port) = args.dashboard_port {
        config.dashboard.port = port;
    }

    let state_path = args
        .state
        .clone()
        .or_else(|| config.state_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

    tracing::debug!(
        "Config loaded: group={}, interval={}min, state={:?}",
        config.group_id,
        config.interval_minutes,
        state_path
    );

    let dashboard_config = config.dashboard.clone();
    let watcher = build_watcher(config, state_path);

    if args.check_once {
        watcher.check_once().await?;
        return Ok(());
    }

    tracing::info!("Starting groupwatch service");
    watcher.start().await;

    let mut dashboard_task = None;
    if dashboard_config.enabled {
        let router = dashboard::build_router(watcher.status_handle(), logs.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_config.port));
        let cancel = watcher.cancellation_token();

        dashboard_task = Some(tokio::spawn(async move {
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        addr.port(),
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        }));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    watcher.stop().await;

    if let Some(task) = dashboard_task {
        let _ = task.await;
    }

    Ok(())
}
