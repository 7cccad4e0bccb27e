//! Error types for the groupwatch service

/// Errors that can occur in the groupwatch service
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("VRChat login failed: {status}")]
    Auth { status: u16 },

    #[error("Fetching group instances failed: {status}")]
    Fetch { status: u16 },

    #[error("Notification delivery failed: {0}")]
    Notify(String),

    #[error("Ledger persistence failed: {0}")]
    Persistence(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for groupwatch operations
pub type Result<T> = std::result::Result<T, WatchError>;
