//! Monthly free-vote allowance top-up.

use std::fmt;

use sqlx::PgPool;

use ujamaa_common::Result;
use ujamaa_ledger::VoteStore;

/// Allowance granted to every member at the start of each month.
pub const FREE_VOTES_PER_MONTH: i32 = 1;

#[derive(Debug, Default)]
pub struct FreeVoteStats {
    pub granted: u64,
}

impl fmt::Display for FreeVoteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "granted={}", self.granted)
    }
}

/// Give every member their allowance for `month`. Safe to run repeatedly:
/// members already topped up this month are left alone, and spent
/// allowances are not refilled.
pub async fn top_up_month(pool: &PgPool, month: &str) -> Result<FreeVoteStats> {
    let votes = VoteStore::new(pool.clone());
    let granted = votes.top_up_all(month, FREE_VOTES_PER_MONTH).await?;
    Ok(FreeVoteStats { granted })
}
