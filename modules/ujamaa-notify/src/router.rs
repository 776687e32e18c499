use async_trait::async_trait;
use tracing::warn;
use ujamaa_common::Role;

use crate::sink::NotifySink;
use crate::types::Notification;

/// Fans every notification out to all configured sinks. A failing sink is
/// logged and skipped; the router itself always reports success so callers
/// never fail an operation over a notification.
pub struct NotifyRouter {
    sinks: Vec<Box<dyn NotifySink>>,
}

impl NotifyRouter {
    pub fn new(sinks: Vec<Box<dyn NotifySink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl NotifySink for NotifyRouter {
    async fn send(&self, member_id: &str, notification: &Notification) -> anyhow::Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.send(member_id, notification).await {
                warn!(
                    error = %e,
                    member_id,
                    category = notification.category(),
                    "Notification send failed"
                );
            }
        }
        Ok(())
    }

    async fn broadcast(&self, role: Role, notification: &Notification) -> anyhow::Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.broadcast(role, notification).await {
                warn!(
                    error = %e,
                    role = %role,
                    category = notification.category(),
                    "Notification broadcast failed"
                );
            }
        }
        Ok(())
    }
}
