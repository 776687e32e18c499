//! Reward issuance. Every STAR, BD, and XP a member earns flows through one
//! of two paths: the share-to-star reconciliation engine (batch, idempotent)
//! or the rule-driven grant (synchronous, at-most-once per action).

pub mod grant;
pub mod reconcile;
pub mod rules;

pub use grant::{Grant, RewardEngine};
pub use reconcile::{
    Award, ReconcileOutcome, ReconcileStats, Reconciler, SHARES_PER_STAR, SHARE_CONVERSION_REASON,
};
pub use rules::{RewardRule, RewardRuleStore};
