//! VRChat session authentication: HTTP Basic login plus conditional TOTP

use std::time::SystemTime;

use crate::config::Config;
use crate::io::HttpClient;
use crate::totp;

pub const API_BASE: &str = "https://api.vrchat.cloud/api/1";

/// Log in on the given session client.
///
/// On success the session's cookie jar holds the auth cookies, so later
/// calls through the same client are authenticated. Credentials never
/// reach the log.
pub async fn authenticate(http: &dyn HttpClient, config: &Config) -> crate::Result<()> {
    tracing::info!("Logging in to VRChat API...");

    let url = format!("{}/auth/user", API_BASE);
    let response = http
        .get_basic_auth(&url, &config.username, &config.password)
        .await?;
    if !response.is_success() {
        return Err(crate::WatchError::Auth {
            status: response.status,
        });
    }

    if !requires_totp(&response.body)? {
        return Ok(());
    }

    if config.totp_secret.trim().is_empty() {
        return Err(crate::WatchError::Config(
            "VRChat requires TOTP but no TOTP secret is configured".to_string(),
        ));
    }

    let code = totp::generate(&config.totp_secret, SystemTime::now())?;
    tracing::info!("Sending TOTP code to VRChat...");

    let verify_url = format!("{}/auth/twofactorauth/totp/verify", API_BASE);
    let response = http
        .post_json(&verify_url, &serde_json::json!({ "code": code }))
        .await?;
    if !response.is_success() {
        if response.status == 429 {
            tracing::warn!(
                "TOTP verify was rate-limited (429); backing off until the next cycle to avoid an account lockout"
            );
        }
        return Err(crate::WatchError::Auth {
            status: response.status,
        });
    }

    Ok(())
}

/// The account endpoint lists outstanding two-factor methods when the
/// basic login alone is not enough.
fn requires_totp(body: &str) -> crate::Result<bool> {
    let parsed: serde_json::Value = serde_json::from_str(body)?;
    let needs_totp = parsed
        .get("requiresTwoFactorAuth")
        .and_then(|methods| methods.as_array())
        .map(|methods| {
            methods
                .iter()
                .filter_map(|method| method.as_str())
                .any(|method| method.eq_ignore_ascii_case("totp"))
        })
        .unwrap_or(false);
    Ok(needs_totp)
}
