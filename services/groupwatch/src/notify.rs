//! Notifier trait for alerting about selected instances

use async_trait::async_trait;

use crate::model::Instance;

/// Trait for delivering a notification about one instance
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "discord")
    fn kind(&self) -> &str;

    /// Deliver a notification for the instance
    async fn notify(&self, instance: &Instance) -> crate::Result<()>;
}

/// Local alert: an operator-visible line through the log sink.
///
/// Viewers read it from the log buffer. Infallible, so it can never block
/// webhook delivery.
#[derive(Debug)]
pub struct LocalAlertNotifier;

#[async_trait]
impl Notifier for LocalAlertNotifier {
    fn kind(&self) -> &str {
        "alert"
    }

    async fn notify(&self, instance: &Instance) -> crate::Result<()> {
        tracing::info!(
            "ALERT {} {} ({})",
            instance.id,
            instance.world_name,
            instance.instance_url
        );
        Ok(())
    }
}
