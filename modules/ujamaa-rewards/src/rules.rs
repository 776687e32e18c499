//! Reward rule lookup. Rules live in the reward_rules table, seeded by
//! migration and tuned by operators; this store only reads them.

use serde::Serialize;
use sqlx::PgPool;
use ujamaa_common::Result;

/// One (category, trigger) -> (xp, stars) mapping.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RewardRule {
    pub category: String,
    pub trigger: String,
    pub xp_value: i64,
    pub star_value: i64,
}

#[derive(Clone)]
pub struct RewardRuleStore {
    pool: PgPool,
}

impl RewardRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn lookup(&self, category: &str, trigger: &str) -> Result<Option<RewardRule>> {
        let row = sqlx::query_as::<_, RewardRule>(
            "SELECT * FROM reward_rules WHERE category = $1 AND trigger = $2",
        )
        .bind(category)
        .bind(trigger)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn all(&self) -> Result<Vec<RewardRule>> {
        let rows =
            sqlx::query_as::<_, RewardRule>("SELECT * FROM reward_rules ORDER BY category, trigger")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }
}
