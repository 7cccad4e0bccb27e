//! Read-only web dashboard: watcher status and the recent log

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::logbuf::{LogBuffer, LogEntry};
use crate::status::{StatusHandle, WatcherStatus};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub status: StatusHandle,
    pub logs: LogBuffer,
}

/// Build the dashboard axum router
pub fn build_router(status: StatusHandle, logs: LogBuffer) -> Router {
    let state = DashboardState { status, logs };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/logs", get(logs_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> Html<String> {
    let status = dashboard.status.read().await.clone();

    let state_label = if status.running { "Running" } else { "Stopped" };
    let last_cycle = match status.last_cycle_ok {
        Some(true) => "OK",
        Some(false) => "Failed",
        None => "Never",
    };

    let log_rows: String = dashboard
        .logs
        .snapshot()
        .iter()
        .rev()
        .map(|entry| {
            format!(
                r#"<tr style="border-bottom: 1px solid #dee2e6;">
                    <td style="padding: 0.25rem 0.5rem; white-space: nowrap;">{}</td>
                    <td style="padding: 0.25rem 0.5rem;">{}</td>
                    <td style="padding: 0.25rem 0.5rem;">{}</td>
                </tr>"#,
                entry.timestamp,
                entry.level,
                html_escape(&entry.message)
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta http-equiv="refresh" content="10">
    <title>Groupwatch</title>
</head>
<body style="font-family: system-ui, sans-serif; margin: 2rem; color: #212529;">
    <h1 style="font-size: 1.5rem;">Groupwatch</h1>
    <p>
        Watcher: <strong>{state_label}</strong> &middot;
        Cycles: {cycles} &middot;
        Last cycle: {last_cycle} &middot;
        Ledger entries: {ledger_entries}
    </p>
    <h2 style="font-size: 1.1rem;">Recent log</h2>
    <table style="border-collapse: collapse; width: 100%; font-size: 0.9em;">
        <thead>
            <tr style="text-align: left; border-bottom: 2px solid #dee2e6;">
                <th style="padding: 0.25rem 0.5rem;">Time</th>
                <th style="padding: 0.25rem 0.5rem;">Level</th>
                <th style="padding: 0.25rem 0.5rem;">Message</th>
            </tr>
        </thead>
        <tbody>{log_rows}</tbody>
    </table>
</body>
</html>"#,
        state_label = state_label,
        cycles = status.cycles_completed,
        last_cycle = last_cycle,
        ledger_entries = status.ledger_entries,
        log_rows = log_rows,
    );

    Html(html)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> Json<WatcherStatus> {
    Json(dashboard.status.read().await.clone())
}

async fn logs_handler(State(dashboard): State<DashboardState>) -> Json<Vec<LogEntry>> {
    Json(dashboard.logs.snapshot())
}

async fn health_handler() -> &'static str {
    "OK"
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
