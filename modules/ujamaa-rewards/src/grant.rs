//! Rule-driven reward grants for non-share actions.
//!
//! Looks up (category, trigger) in reward_rules and appends the configured
//! XP and STAR deltas in one transaction. Not idempotent: the caller invokes
//! it at most once per underlying action.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use ujamaa_common::{Currency, Result, Role};
use ujamaa_ledger::LedgerStore;
use ujamaa_notify::{Notification, NotifySink};

use crate::rules::RewardRuleStore;

/// What a grant paid out. Zero on both axes means no rule matched (or the
/// rule is all zeroes) and no ledger rows were written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub xp: i64,
    pub stars: i64,
}

impl Grant {
    pub fn is_zero(&self) -> bool {
        self.xp == 0 && self.stars == 0
    }
}

fn reason(category: &str, trigger: &str) -> String {
    format!("{category}:{trigger}")
}

pub struct RewardEngine {
    pool: PgPool,
    rules: RewardRuleStore,
    notifier: Arc<dyn NotifySink>,
}

impl RewardEngine {
    pub fn new(pool: PgPool, notifier: Arc<dyn NotifySink>) -> Self {
        let rules = RewardRuleStore::new(pool.clone());
        Self {
            pool,
            rules,
            notifier,
        }
    }

    /// Grant whatever the rules say for this action. An unknown
    /// (category, trigger) is a zero grant, not an error. Both appends land
    /// in one transaction; a zero-valued currency is skipped entirely.
    pub async fn grant(&self, member_id: &str, category: &str, trigger: &str) -> Result<Grant> {
        let Some(rule) = self.rules.lookup(category, trigger).await? else {
            debug!(category, trigger, "No reward rule, zero grant");
            return Ok(Grant::default());
        };

        let grant = Grant {
            xp: rule.xp_value,
            stars: rule.star_value,
        };
        if grant.is_zero() {
            return Ok(grant);
        }

        let reason = reason(category, trigger);
        let mut tx = self.pool.begin().await?;

        if grant.xp != 0 {
            LedgerStore::append_in(&mut tx, Currency::Xp, member_id, grant.xp, &reason).await?;
        }
        if grant.stars != 0 {
            LedgerStore::append_in(&mut tx, Currency::Star, member_id, grant.stars, &reason)
                .await?;
        }

        tx.commit().await?;

        self.notify_grant(member_id, category, trigger, grant).await;

        Ok(grant)
    }

    async fn notify_grant(&self, member_id: &str, category: &str, trigger: &str, grant: Grant) {
        let to_member = Notification::RewardUpdate {
            category: category.to_string(),
            trigger: trigger.to_string(),
            xp: grant.xp,
            stars: grant.stars,
        };
        if let Err(e) = self.notifier.send(member_id, &to_member).await {
            warn!(error = %e, member_id, "Failed to notify member of grant");
        }

        let to_admins = Notification::MemberActivity {
            member_id: member_id.to_string(),
            activity: reason(category, trigger),
            xp: grant.xp,
            stars: grant.stars,
        };
        if let Err(e) = self.notifier.broadcast(Role::Admin, &to_admins).await {
            warn!(error = %e, "Failed to broadcast grant to admins");
        }
    }
}
