use async_trait::async_trait;
use ujamaa_common::Role;

use crate::sink::NotifySink;
use crate::types::Notification;

/// No-op sink for tests and notification-less deployments.
pub struct NoopSink;

#[async_trait]
impl NotifySink for NoopSink {
    async fn send(&self, _member_id: &str, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }

    async fn broadcast(&self, _role: Role, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}
