//! Discord webhook notification client

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::io::HttpClient;
use crate::model::Instance;
use crate::notify::Notifier;
use crate::watcher::SharedConfig;

/// Sends one embed per instance to the configured Discord webhook.
///
/// The webhook URL is read from the shared config on every delivery so
/// config updates take effect without rebuilding the notifier. An empty
/// URL disables delivery without being an error.
pub struct DiscordWebhookNotifier {
    config: SharedConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordWebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordWebhookNotifier").finish()
    }
}

impl DiscordWebhookNotifier {
    pub fn new(config: SharedConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl Notifier for DiscordWebhookNotifier {
    fn kind(&self) -> &str {
        "discord"
    }

    async fn notify(&self, instance: &Instance) -> crate::Result<()> {
        let webhook_url = self.config.read().await.webhook_url.clone();
        if webhook_url.trim().is_empty() {
            tracing::debug!("No webhook URL configured; skipping webhook delivery");
            return Ok(());
        }

        let payload = build_payload(instance);
        let response = self.http.post_json(&webhook_url, &payload).await?;
        tracing::info!("Discord webhook: {}", response.status);
        if !response.is_success() {
            return Err(crate::WatchError::Notify(format!(
                "Webhook returned status {}",
                response.status
            )));
        }
        Ok(())
    }
}

fn build_payload(instance: &Instance) -> serde_json::Value {
    let created = instance
        .world_created_at
        .map(|at| at.format("%Y年%m月%d日").to_string())
        .unwrap_or_else(|| "-".to_string());
    let popularity = instance
        .popularity
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string());
    let favorites = instance
        .favorites
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string());
    let image = match &instance.thumbnail_url {
        Some(url) if !url.trim().is_empty() => json!({ "url": url }),
        _ => serde_json::Value::Null,
    };

    json!({
        "content": "グループインスタンス通知",
        "embeds": [{
            "title": instance.world_name,
            "url": instance.world_url,
            "description": instance.world_description,
            "image": image,
            "fields": [
                { "name": "ワールド公開日", "value": created, "inline": false },
                { "name": ":fire: Popularity", "value": popularity, "inline": true },
                { "name": ":bookmark: Bookmarks", "value": favorites, "inline": true }
            ]
        }],
        "components": [{
            "type": 1,
            "components": [{
                "type": 2,
                "style": 5,
                "url": instance.instance_url,
                "label": "Launch Instance"
            }]
        }]
    })
}
