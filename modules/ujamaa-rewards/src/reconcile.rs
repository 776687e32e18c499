//! The share-to-star reconciliation engine.
//!
//! Converts unawarded share events into STAR credits at a fixed rate, exactly
//! once. Each member settles in their own transaction: the candidate list is
//! advisory, the count is re-derived under FOR UPDATE row locks, and the
//! ledger append commits atomically with the awarded-flag flips. A crash or
//! failure between passes leaves shares unawarded, never double-paid; the
//! next pass picks them up.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use ujamaa_common::{Currency, Result, Role, UjamaaError};
use ujamaa_events::EventLog;
use ujamaa_ledger::LedgerStore;
use ujamaa_notify::{Notification, NotifySink};

/// Conversion rate: this many verified shares earn one STAR.
pub const SHARES_PER_STAR: i64 = 3;

/// Reason string on every conversion ledger row. The engine is the only
/// writer of star rows bearing this reason.
pub const SHARE_CONVERSION_REASON: &str = "3 verified shares = 1 STAR";

/// One member's credit from a reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct Award {
    pub member_id: String,
    pub delta: i64,
}

/// Stats from one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileStats {
    pub members_scanned: u64,
    pub members_awarded: u64,
    pub stars_issued: u64,
    pub shares_consumed: u64,
    pub failures: u64,
}

impl fmt::Display for ReconcileStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "members_scanned={} members_awarded={} stars_issued={} shares_consumed={} failures={}",
            self.members_scanned,
            self.members_awarded,
            self.stars_issued,
            self.shares_consumed,
            self.failures,
        )
    }
}

/// What a pass did: the individual awards plus the run stats.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub awards: Vec<Award>,
    pub stats: ReconcileStats,
}

fn stars_for(unawarded: usize) -> i64 {
    unawarded as i64 / SHARES_PER_STAR
}

pub struct Reconciler {
    pool: PgPool,
    events: EventLog,
    notifier: Arc<dyn NotifySink>,
}

impl Reconciler {
    pub fn new(pool: PgPool, notifier: Arc<dyn NotifySink>) -> Self {
        let events = EventLog::new(pool.clone());
        Self {
            pool,
            events,
            notifier,
        }
    }

    /// Run one reconciliation pass over all members with convertible shares.
    ///
    /// A failure while settling one member rolls back that member alone and
    /// the pass continues; their shares stay unawarded for the next pass.
    pub async fn run(&self) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();

        let candidates = self.events.pending_share_counts(SHARES_PER_STAR).await?;
        outcome.stats.members_scanned = candidates.len() as u64;

        for candidate in candidates {
            match self.settle_member(&candidate.member_id).await {
                Ok(Some(award)) => {
                    outcome.stats.members_awarded += 1;
                    outcome.stats.stars_issued += award.delta as u64;
                    outcome.stats.shares_consumed += (award.delta * SHARES_PER_STAR) as u64;
                    self.notify_award(&award).await;
                    outcome.awards.push(award);
                }
                Ok(None) => {
                    // Count dropped below the rate between the candidate
                    // query and the lock. Nothing owed.
                }
                Err(e) => {
                    outcome.stats.failures += 1;
                    warn!(
                        error = %e,
                        member_id = %candidate.member_id,
                        "Share award failed, continuing with remaining members"
                    );
                }
            }
        }

        info!("Reconciliation pass complete. {}", outcome.stats);
        Ok(outcome)
    }

    /// Settle one member: lock their unawarded shares, credit whole STARs,
    /// consume exactly the oldest `stars * 3` shares. All or nothing.
    async fn settle_member(&self, member_id: &str) -> Result<Option<Award>> {
        let mut tx = self.pool.begin().await?;

        let locked = EventLog::lock_unawarded(&mut tx, member_id).await?;
        let stars = stars_for(locked.len());
        if stars == 0 {
            return Ok(None);
        }

        let consume: Vec<i64> = locked
            .iter()
            .take((stars * SHARES_PER_STAR) as usize)
            .map(|e| e.id)
            .collect();

        LedgerStore::append_in(
            &mut tx,
            Currency::Star,
            member_id,
            stars,
            SHARE_CONVERSION_REASON,
        )
        .await?;

        let flipped = EventLog::mark_awarded(&mut tx, &consume).await?;
        if flipped != consume.len() as u64 {
            return Err(UjamaaError::Other(anyhow!(
                "expected to consume {} shares for {member_id}, consumed {flipped}",
                consume.len()
            )));
        }

        tx.commit().await?;

        Ok(Some(Award {
            member_id: member_id.to_string(),
            delta: stars,
        }))
    }

    /// Best-effort post-commit notifications. Failure is logged, never
    /// propagated; the award already stands.
    async fn notify_award(&self, award: &Award) {
        let shares = award.delta * SHARES_PER_STAR;
        let to_member = Notification::StarAward {
            delta: award.delta,
            message: format!("You earned {} STAR for {shares} verified shares", award.delta),
        };
        if let Err(e) = self.notifier.send(&award.member_id, &to_member).await {
            warn!(error = %e, member_id = %award.member_id, "Failed to notify member of award");
        }

        let to_admins = Notification::MemberActivity {
            member_id: award.member_id.clone(),
            activity: "share_conversion".to_string(),
            xp: 0,
            stars: award.delta,
        };
        if let Err(e) = self.notifier.broadcast(Role::Admin, &to_admins).await {
            warn!(error = %e, "Failed to broadcast award to admins");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_stars_only() {
        assert_eq!(stars_for(0), 0);
        assert_eq!(stars_for(1), 0);
        assert_eq!(stars_for(2), 0);
        assert_eq!(stars_for(3), 1);
        assert_eq!(stars_for(5), 1);
        assert_eq!(stars_for(6), 2);
        assert_eq!(stars_for(7), 2);
        assert_eq!(stars_for(100), 33);
    }

    #[test]
    fn stats_render_as_key_value_pairs() {
        let stats = ReconcileStats {
            members_scanned: 4,
            members_awarded: 2,
            stars_issued: 3,
            shares_consumed: 9,
            failures: 1,
        };
        assert_eq!(
            stats.to_string(),
            "members_scanned=4 members_awarded=2 stars_issued=3 shares_consumed=9 failures=1"
        );
    }
}
