//! Outbound webhook for admin broadcasts. Points at a chat incoming webhook
//! (or anything accepting `{"text": ...}`); configured via ADMIN_WEBHOOK_URL.

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;
use ujamaa_common::Role;

use crate::sink::NotifySink;
use crate::types::Notification;

pub struct AdminWebhook {
    webhook_url: String,
    http: reqwest::Client,
}

impl AdminWebhook {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Admin webhook returned non-success");
            anyhow::bail!("admin webhook returned {status}");
        }

        Ok(())
    }
}

#[async_trait]
impl NotifySink for AdminWebhook {
    /// The webhook is an admin channel; member-directed sends don't go out.
    async fn send(&self, _member_id: &str, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }

    async fn broadcast(&self, role: Role, notification: &Notification) -> anyhow::Result<()> {
        if role != Role::Admin {
            return Ok(());
        }

        let payload = json!({
            "text": notification.summary(),
            "unfurl_links": false,
        });

        self.post(payload).await
    }
}
