//! Video review submissions and their pending -> approved/rejected lifecycle.
//! The STAR award for an approved review is appended by the caller, not here.

use sqlx::{PgConnection, PgPool};
use ujamaa_common::{Result, UjamaaError};

use crate::types::{NewReview, VideoReview};

#[derive(Clone)]
pub struct ReviewStore {
    pool: PgPool,
}

impl ReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, review: NewReview) -> Result<VideoReview> {
        let row = sqlx::query_as::<_, VideoReview>(
            r#"
            INSERT INTO video_reviews
                (member_id, business_name, business_address, service_type,
                 what_makes_special, video_url, self_score, checklist)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&review.member_id)
        .bind(&review.business_name)
        .bind(&review.business_address)
        .bind(&review.service_type)
        .bind(&review.what_makes_special)
        .bind(&review.video_url)
        .bind(review.self_score)
        .bind(&review.checklist)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Result<Option<VideoReview>> {
        let row = sqlx::query_as::<_, VideoReview>("SELECT * FROM video_reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_pending(&self, limit: u32) -> Result<Vec<VideoReview>> {
        let rows = sqlx::query_as::<_, VideoReview>(
            r#"
            SELECT * FROM video_reviews
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_for_member(&self, member_id: &str, limit: u32) -> Result<Vec<VideoReview>> {
        let rows = sqlx::query_as::<_, VideoReview>(
            r#"
            SELECT * FROM video_reviews
            WHERE member_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM video_reviews WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Approve a pending review. The single-statement guard on status makes
    /// a concurrent double-approve lose cleanly with NotFound.
    pub async fn approve(&self, id: i64) -> Result<VideoReview> {
        let mut conn = self.pool.acquire().await?;
        Self::approve_in(&mut conn, id).await
    }

    /// Approve inside a caller-owned transaction, so the status flip and the
    /// STAR payout commit or roll back together.
    pub async fn approve_in(conn: &mut PgConnection, id: i64) -> Result<VideoReview> {
        Self::transition(conn, id, "approved").await
    }

    /// Reject a pending review.
    pub async fn reject(&self, id: i64) -> Result<VideoReview> {
        let mut conn = self.pool.acquire().await?;
        Self::transition(&mut conn, id, "rejected").await
    }

    async fn transition(conn: &mut PgConnection, id: i64, status: &str) -> Result<VideoReview> {
        let row = sqlx::query_as::<_, VideoReview>(
            r#"
            UPDATE video_reviews
            SET status = $2, reviewed_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?;

        row.ok_or_else(|| UjamaaError::NotFound(format!("pending video review {id}")))
    }
}
