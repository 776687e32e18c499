use chrono::{DateTime, Utc};
use serde::Serialize;
use ujamaa_common::{RankTier, Role};

/// A row from one of the per-currency transaction tables.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub member_id: String,
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A transaction tagged with its currency, from the merged admin feed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FeedEntry {
    pub currency: String,
    pub member_id: String,
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A members-table row. `star_total` and `star_rank` are caches written by
/// the rank refresh job; the ledger remains the source of truth.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Member {
    pub member_id: String,
    pub provider: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub star_total: i64,
    pub star_rank: String,
    pub created_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        matches!(self.role.parse(), Ok(Role::Admin))
    }

    /// Cached rank tier as of the last rank refresh.
    pub fn rank(&self) -> RankTier {
        self.star_rank.parse().unwrap_or(RankTier::Initiate)
    }
}

/// Identity fields captured at login, used to upsert the member row.
#[derive(Debug, Clone, Default)]
pub struct MemberIdentity {
    pub member_id: String,
    pub provider: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// All three balances for one member, each a live `SUM(delta)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub star: i64,
    pub bd: i64,
    pub xp: i64,
}
