//! LedgerStore — append-only currency ledgers backed by Postgres.
//!
//! One table per currency, identical shape. Appends go through here whether
//! they come from the reward engine, the reconciler, or an admin grant, so
//! every balance stays derivable as a single SUM.

use sqlx::{PgConnection, PgPool};
use ujamaa_common::{rank_from_stars, Currency, RankTier, Result, UjamaaError};

use crate::types::{Balances, FeedEntry, LedgerEntry};

// Table names are hardcoded constants, not user input -- safe to interpolate.
fn table(currency: Currency) -> &'static str {
    match currency {
        Currency::Star => "star_transactions",
        Currency::Bd => "bd_transactions",
        Currency::Xp => "xp_transactions",
    }
}

#[derive(Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| UjamaaError::Other(e.into()))?;
        Ok(())
    }

    /// Append one transaction row. The delta may be negative (spends); the
    /// row is immutable once written.
    pub async fn append(
        &self,
        currency: Currency,
        member_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<LedgerEntry> {
        let mut conn = self.pool.acquire().await?;
        Self::append_in(&mut conn, currency, member_id, delta, reason).await
    }

    /// Append inside a caller-held connection or transaction. This is the
    /// variant the reconciler and vote store use so the append commits or
    /// rolls back together with their other writes.
    pub async fn append_in(
        conn: &mut PgConnection,
        currency: Currency,
        member_id: &str,
        delta: i64,
        reason: &str,
    ) -> Result<LedgerEntry> {
        let query = format!(
            r#"
            INSERT INTO {} (member_id, delta, reason)
            VALUES ($1, $2, $3)
            RETURNING id, member_id, delta, reason, created_at
            "#,
            table(currency)
        );

        let entry = sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(member_id)
            .bind(delta)
            .bind(reason)
            .fetch_one(&mut *conn)
            .await?;

        Ok(entry)
    }

    /// Net balance for one currency: COALESCE(SUM(delta), 0).
    pub async fn balance(&self, currency: Currency, member_id: &str) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::balance_in(&mut conn, currency, member_id).await
    }

    /// Balance read inside a caller-held connection, for checks that must
    /// see rows locked by the surrounding transaction.
    pub async fn balance_in(
        conn: &mut PgConnection,
        currency: Currency,
        member_id: &str,
    ) -> Result<i64> {
        let query = format!(
            "SELECT COALESCE(SUM(delta), 0) FROM {} WHERE member_id = $1",
            table(currency)
        );

        let (balance,): (i64,) = sqlx::query_as(&query)
            .bind(member_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(balance)
    }

    /// All three balances in one round trip.
    pub async fn balances(&self, member_id: &str) -> Result<Balances> {
        let (star, bd, xp): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE((SELECT SUM(delta) FROM star_transactions WHERE member_id = $1), 0),
                COALESCE((SELECT SUM(delta) FROM bd_transactions   WHERE member_id = $1), 0),
                COALESCE((SELECT SUM(delta) FROM xp_transactions   WHERE member_id = $1), 0)
            "#,
        )
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Balances { star, bd, xp })
    }

    /// Recent transactions for one member, newest first.
    pub async fn history(
        &self,
        currency: Currency,
        member_id: &str,
        limit: u32,
    ) -> Result<Vec<LedgerEntry>> {
        let query = format!(
            r#"
            SELECT id, member_id, delta, reason, created_at
            FROM {}
            WHERE member_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
            table(currency)
        );

        let rows = sqlx::query_as::<_, LedgerEntry>(&query)
            .bind(member_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Latest transactions across all currencies and members, newest first.
    /// Feeds the admin activity stream.
    pub async fn recent_entries(&self, limit: u32) -> Result<Vec<FeedEntry>> {
        let rows = sqlx::query_as::<_, FeedEntry>(
            r#"
            SELECT * FROM (
                SELECT 'star' AS currency, member_id, delta, reason, created_at
                    FROM star_transactions
                UNION ALL
                SELECT 'bd' AS currency, member_id, delta, reason, created_at
                    FROM bd_transactions
                UNION ALL
                SELECT 'xp' AS currency, member_id, delta, reason, created_at
                    FROM xp_transactions
            ) AS merged
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Net units in circulation across all members.
    pub async fn circulation(&self, currency: Currency) -> Result<i64> {
        let query = format!("SELECT COALESCE(SUM(delta), 0) FROM {}", table(currency));

        let (total,): (i64,) = sqlx::query_as(&query).fetch_one(&self.pool).await?;

        Ok(total)
    }

    /// Live rank: the STAR balance summed fresh and mapped to its tier,
    /// bypassing the cached columns on members.
    pub async fn rank(&self, member_id: &str) -> Result<(i64, RankTier)> {
        let total = self.balance(Currency::Star, member_id).await?;
        Ok((total, rank_from_stars(total)))
    }
}
