//! Contest voting: STAR-paid votes and the monthly free-vote allowance.
//!
//! Both payment paths run inside one transaction that also locks the voter's
//! member row, so two concurrent spends by the same member serialize and the
//! balance check can't be raced past zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use ujamaa_common::{Currency, Result, UjamaaError};

use crate::store::LedgerStore;

/// STARs burned per contest vote when paying with stars.
pub const STAR_COST_PER_VOTE: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayWith {
    Free,
    Stars,
}

impl fmt::Display for PayWith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayWith::Free => write!(f, "free"),
            PayWith::Stars => write!(f, "stars"),
        }
    }
}

/// Allowance bucket key, one per calendar month.
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// What a successful cast cost the member.
#[derive(Debug, Clone, Serialize)]
pub struct VoteReceipt {
    pub vote_id: i64,
    pub member_id: String,
    pub contest_id: String,
    pub contestant_id: String,
    pub votes: i32,
    pub pay_with: PayWith,
    pub stars_spent: i64,
    pub free_votes_spent: i32,
}

#[derive(Clone)]
pub struct VoteStore {
    pool: PgPool,
}

impl VoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cast votes in a contest, paying with STARs or the monthly allowance.
    /// Fails with InsufficientFunds before writing anything when the member
    /// can't cover the cost.
    pub async fn cast(
        &self,
        member_id: &str,
        contest_id: &str,
        contestant_id: &str,
        votes: i32,
        pay_with: PayWith,
    ) -> Result<VoteReceipt> {
        if votes < 1 {
            return Err(UjamaaError::Validation(format!(
                "vote count must be at least 1, got {votes}"
            )));
        }

        let mut tx = self.pool.begin().await?;

        // Serialize concurrent spends by the same member on their row.
        let locked = sqlx::query_as::<_, (String,)>(
            "SELECT member_id FROM members WHERE member_id = $1 FOR UPDATE",
        )
        .bind(member_id)
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Err(UjamaaError::UnknownMember(member_id.to_string()));
        }

        let mut stars_spent = 0i64;
        let mut free_votes_spent = 0i32;

        match pay_with {
            PayWith::Free => {
                let month = month_key(Utc::now());
                let row = sqlx::query_as::<_, (i32,)>(
                    r#"
                    SELECT free_votes_remaining FROM monthly_free_votes
                    WHERE member_id = $1 AND month_key = $2
                    FOR UPDATE
                    "#,
                )
                .bind(member_id)
                .bind(&month)
                .fetch_optional(&mut *tx)
                .await?;

                let available = row.map(|(n,)| n).unwrap_or(0);
                if available < votes {
                    return Err(UjamaaError::InsufficientFunds {
                        needed: votes as i64,
                        available: available as i64,
                    });
                }

                sqlx::query(
                    r#"
                    UPDATE monthly_free_votes
                    SET free_votes_remaining = free_votes_remaining - $3
                    WHERE member_id = $1 AND month_key = $2
                    "#,
                )
                .bind(member_id)
                .bind(&month)
                .bind(votes)
                .execute(&mut *tx)
                .await?;

                free_votes_spent = votes;
            }
            PayWith::Stars => {
                let needed = votes as i64 * STAR_COST_PER_VOTE;
                let available =
                    LedgerStore::balance_in(&mut tx, Currency::Star, member_id).await?;

                if available < needed {
                    return Err(UjamaaError::InsufficientFunds { needed, available });
                }

                LedgerStore::append_in(
                    &mut tx,
                    Currency::Star,
                    member_id,
                    -needed,
                    &format!("contest_vote:{contest_id}"),
                )
                .await?;

                stars_spent = needed;
            }
        }

        let (vote_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO votes (member_id, contest_id, contestant_id, votes, pay_with)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(member_id)
        .bind(contest_id)
        .bind(contestant_id)
        .bind(votes)
        .bind(pay_with.to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VoteReceipt {
            vote_id,
            member_id: member_id.to_string(),
            contest_id: contest_id.to_string(),
            contestant_id: contestant_id.to_string(),
            votes,
            pay_with,
            stars_spent,
            free_votes_spent,
        })
    }

    /// Grant a member their allowance for a month. Idempotent: a second call
    /// for the same (member, month) changes nothing, even after spends.
    pub async fn top_up(&self, member_id: &str, month: &str, votes: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO monthly_free_votes (member_id, month_key, free_votes_remaining)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id, month_key) DO NOTHING
            "#,
        )
        .bind(member_id)
        .bind(month)
        .bind(votes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Grant the whole membership their allowance for a month in one
    /// statement. Returns how many members were newly topped up.
    pub async fn top_up_all(&self, month: &str, votes: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO monthly_free_votes (member_id, month_key, free_votes_remaining)
            SELECT member_id, $1, $2 FROM members
            ON CONFLICT (member_id, month_key) DO NOTHING
            "#,
        )
        .bind(month)
        .bind(votes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn free_votes_remaining(&self, member_id: &str, month: &str) -> Result<i32> {
        let row = sqlx::query_as::<_, (i32,)>(
            r#"
            SELECT free_votes_remaining FROM monthly_free_votes
            WHERE member_id = $1 AND month_key = $2
            "#,
        )
        .bind(member_id)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(n,)| n).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_key_is_year_dash_month() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(month_key(ts), "2025-03");
    }

    #[test]
    fn pay_with_roundtrips_through_serde() {
        let json = serde_json::to_string(&PayWith::Stars).unwrap();
        assert_eq!(json, "\"stars\"");
        let parsed: PayWith = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, PayWith::Free);
    }
}
