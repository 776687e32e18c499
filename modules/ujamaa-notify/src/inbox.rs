//! Persisted notification inbox. Member-directed sends are written to the
//! notifications table so offline members catch up later; role broadcasts are
//! transient and skip the inbox.

use async_trait::async_trait;
use sqlx::PgPool;
use ujamaa_common::{Result, Role, UjamaaError};

use crate::sink::NotifySink;
use crate::types::{Notification, StoredNotification};

#[derive(Clone)]
pub struct InboxStore {
    pool: PgPool,
}

impl InboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A member's inbox, newest first.
    pub async fn list(&self, member_id: &str, limit: u32) -> Result<Vec<StoredNotification>> {
        let rows = sqlx::query_as::<_, StoredNotification>(
            r#"
            SELECT * FROM notifications
            WHERE member_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn unread_count(&self, member_id: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE member_id = $1 AND read = FALSE",
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one of the member's own notifications read. Scoped to the member
    /// so nobody can mark someone else's.
    pub async fn mark_read(&self, member_id: &str, id: i64) -> Result<()> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND member_id = $2")
                .bind(id)
                .bind(member_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(UjamaaError::NotFound(format!("notification {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl NotifySink for InboxStore {
    async fn send(&self, member_id: &str, notification: &Notification) -> anyhow::Result<()> {
        let payload = serde_json::to_value(notification)?;

        sqlx::query(
            r#"
            INSERT INTO notifications (member_id, category, payload)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(member_id)
        .bind(notification.category())
        .bind(payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn broadcast(&self, _role: Role, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}
