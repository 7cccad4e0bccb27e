//! Configuration types for the groupwatch service

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Poll interval used when the configured one is zero or negative
pub const FALLBACK_INTERVAL_MINUTES: i64 = 5;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub group_id: String,
    /// Base32-encoded TOTP secret for two-factor login
    #[serde(default)]
    pub totp_secret: String,
    /// Discord webhook URL; empty disables webhook delivery
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,
    /// Override for the notification ledger path
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            group_id: String::new(),
            totp_secret: String::new(),
            webhook_url: String::new(),
            interval_minutes: default_interval_minutes(),
            state_path: None,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl Config {
    /// A config is usable once the credentials, the group and the TOTP
    /// secret are present. The webhook URL stays optional: without it the
    /// watcher still runs and only emits local alerts.
    pub fn is_valid(&self) -> bool {
        !self.username.trim().is_empty()
            && !self.password.trim().is_empty()
            && !self.group_id.trim().is_empty()
            && !self.totp_secret.trim().is_empty()
    }

    /// Effective sleep between poll cycles
    pub fn effective_interval(&self) -> Duration {
        let minutes = if self.interval_minutes <= 0 {
            FALLBACK_INTERVAL_MINUTES
        } else {
            self.interval_minutes
        };
        Duration::from_secs(minutes as u64 * 60)
    }

    /// Resolve `env:NAME` indirections in credential fields from the
    /// environment, so secrets can stay out of the config file.
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        for field in [
            &mut self.username,
            &mut self.password,
            &mut self.totp_secret,
            &mut self.webhook_url,
        ] {
            let name = match field.strip_prefix("env:") {
                Some(name) => name.to_string(),
                None => continue,
            };
            *field = std::env::var(&name).map_err(|_| {
                crate::WatchError::Config(format!("Environment variable {} is not set", name))
            })?;
        }
        Ok(())
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_interval_minutes() -> i64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11115
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::WatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
