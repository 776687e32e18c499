//! EventLog — append-only intake for share and activity events.
//!
//! Appends happen on the request path and must stay cheap: no dedup, no
//! reward math here. The locking pair `lock_unawarded` / `mark_awarded` runs
//! inside a transaction owned by the reconciliation engine; this crate never
//! opens that transaction itself.

use sqlx::{PgConnection, PgPool};
use ujamaa_common::{Result, SharePlatform, UjamaaError};

use crate::types::{ActivityEvent, PendingShares, ShareEvent, StoredActivity};

#[derive(Clone)]
pub struct EventLog {
    pool: PgPool,
}

impl EventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a share event. Every submission lands as its own row; repeated
    /// shares of the same URL stay distinct events.
    pub async fn append_share(
        &self,
        member_id: &str,
        platform: SharePlatform,
        share_url: Option<&str>,
        proof_url: Option<&str>,
    ) -> Result<ShareEvent> {
        let event = sqlx::query_as::<_, ShareEvent>(
            r#"
            INSERT INTO share_events (member_id, platform, share_url, proof_url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(platform.to_string())
        .bind(share_url)
        .bind(proof_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Record an activity event with its tagged JSON payload.
    pub async fn append_activity(
        &self,
        member_id: &str,
        event: &ActivityEvent,
    ) -> Result<StoredActivity> {
        let payload =
            serde_json::to_value(event).map_err(|e| UjamaaError::Other(e.into()))?;

        let stored = sqlx::query_as::<_, StoredActivity>(
            r#"
            INSERT INTO activity_events (member_id, event_type, payload)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(event.event_type_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Members holding at least `min_count` unawarded shares. Advisory only:
    /// the engine re-derives the count under row locks before awarding.
    pub async fn pending_share_counts(&self, min_count: i64) -> Result<Vec<PendingShares>> {
        let rows = sqlx::query_as::<_, PendingShares>(
            r#"
            SELECT member_id, COUNT(*) AS unawarded
            FROM share_events
            WHERE awarded = FALSE
            GROUP BY member_id
            HAVING COUNT(*) >= $1
            ORDER BY member_id
            "#,
        )
        .bind(min_count)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lock one member's unawarded shares inside the caller's transaction,
    /// oldest first with id as the tiebreaker. Rows stay locked until the
    /// transaction ends.
    pub async fn lock_unawarded(
        conn: &mut PgConnection,
        member_id: &str,
    ) -> Result<Vec<ShareEvent>> {
        let rows = sqlx::query_as::<_, ShareEvent>(
            r#"
            SELECT * FROM share_events
            WHERE member_id = $1 AND awarded = FALSE
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#,
        )
        .bind(member_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Flip exactly the given rows to awarded. Returns how many flipped.
    pub async fn mark_awarded(conn: &mut PgConnection, ids: &[i64]) -> Result<u64> {
        let result = sqlx::query("UPDATE share_events SET awarded = TRUE WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// One member's shares, newest first.
    pub async fn shares_for_member(
        &self,
        member_id: &str,
        limit: u32,
    ) -> Result<Vec<ShareEvent>> {
        let rows = sqlx::query_as::<_, ShareEvent>(
            r#"
            SELECT * FROM share_events
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

    /// Latest shares across all members, for the admin view.
    pub async fn recent_shares(&self, limit: u32) -> Result<Vec<ShareEvent>> {
        let rows = sqlx::query_as::<_, ShareEvent>(
            r#"
            SELECT * FROM share_events
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Unawarded share rows across the whole table.
    pub async fn unawarded_total(&self) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM share_events WHERE awarded = FALSE")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// One member's activity events, newest first.
    pub async fn recent_activity(
        &self,
        member_id: &str,
        limit: u32,
    ) -> Result<Vec<StoredActivity>> {
        let rows = sqlx::query_as::<_, StoredActivity>(
            r#"
            SELECT * FROM activity_events
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
}
