//! Opaque AI metric scores. The models producing them are external; we store
//! the numbers and let the caller decide whether a score earns anything.

use sqlx::PgPool;
use ujamaa_common::Result;

use crate::types::{AiMetric, MetricKind};

#[derive(Clone)]
pub struct AiMetricStore {
    pool: PgPool,
}

impl AiMetricStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        member_id: &str,
        kind: MetricKind,
        score: f64,
        metadata: Option<serde_json::Value>,
    ) -> Result<AiMetric> {
        let row = sqlx::query_as::<_, AiMetric>(
            r#"
            INSERT INTO ai_metrics (member_id, metric_type, score, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(kind.to_string())
        .bind(score)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn latest(
        &self,
        member_id: &str,
        kind: MetricKind,
        limit: u32,
    ) -> Result<Vec<AiMetric>> {
        let rows = sqlx::query_as::<_, AiMetric>(
            r#"
            SELECT * FROM ai_metrics
            WHERE member_id = $1 AND metric_type = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(member_id)
        .bind(kind.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
