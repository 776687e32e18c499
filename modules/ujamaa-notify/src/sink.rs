use async_trait::async_trait;
use ujamaa_common::Role;

use crate::types::Notification;

/// Pluggable delivery channel for notifications.
///
/// Implementations report failures through the Result but must never panic
/// the caller; delivery to an absent or offline member is a silent success.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Deliver to one member.
    async fn send(&self, member_id: &str, notification: &Notification) -> anyhow::Result<()>;

    /// Deliver to every reachable member holding the role.
    async fn broadcast(&self, role: Role, notification: &Notification) -> anyhow::Result<()>;
}
