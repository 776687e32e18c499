//! Rank refresh: recompute the cached star totals and tiers on members.

use std::fmt;

use sqlx::PgPool;
use tracing::warn;

use ujamaa_common::{rank_from_stars, Currency, Result};
use ujamaa_ledger::{LedgerStore, MemberStore};

#[derive(Debug, Default)]
pub struct RankStats {
    pub members_scanned: u64,
    pub members_updated: u64,
    pub failures: u64,
}

impl fmt::Display for RankStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "members_scanned={} members_updated={} failures={}",
            self.members_scanned, self.members_updated, self.failures
        )
    }
}

/// Walk every member, sum their STAR ledger fresh, and rewrite the cached
/// star_total / star_rank columns where they drifted. A failure on one
/// member is logged and the walk continues.
pub async fn refresh_ranks(pool: &PgPool) -> Result<RankStats> {
    let members = MemberStore::new(pool.clone());
    let ledger = LedgerStore::new(pool.clone());

    let mut stats = RankStats::default();
    for member_id in members.member_ids().await? {
        stats.members_scanned += 1;
        match refresh_member(&members, &ledger, &member_id).await {
            Ok(true) => stats.members_updated += 1,
            Ok(false) => {}
            Err(e) => {
                stats.failures += 1;
                warn!(
                    member_id = member_id.as_str(),
                    error = %e,
                    "Rank refresh failed for member"
                );
            }
        }
    }

    Ok(stats)
}

async fn refresh_member(
    members: &MemberStore,
    ledger: &LedgerStore,
    member_id: &str,
) -> Result<bool> {
    let member = members.require(member_id).await?;
    let total = ledger.balance(Currency::Star, member_id).await?;
    let tier = rank_from_stars(total);

    if member.star_total == total && member.rank() == tier {
        return Ok(false);
    }

    members.set_rank_cache(member_id, total, tier).await?;
    Ok(true)
}
