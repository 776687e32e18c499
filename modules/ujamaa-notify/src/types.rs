use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Push payloads, tagged for the websocket wire and the inbox table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The reconciler credited STARs for converted shares.
    StarAward { delta: i64, message: String },
    /// A reward grant landed (XP and/or STARs).
    RewardUpdate {
        category: String,
        trigger: String,
        xp: i64,
        stars: i64,
    },
    /// Admin-facing echo of member activity.
    MemberActivity {
        member_id: String,
        activity: String,
        xp: i64,
        stars: i64,
    },
    /// A video review was approved and paid out.
    ReviewApproved { stars: i64 },
    /// An admin issued Black Dollars.
    BdIssued { amount: i64, reason: String },
}

impl Notification {
    /// Category string for the inbox table and webhook rendering.
    pub fn category(&self) -> &'static str {
        match self {
            Notification::StarAward { .. } => "star_award",
            Notification::RewardUpdate { .. } => "reward_update",
            Notification::MemberActivity { .. } => "member_activity",
            Notification::ReviewApproved { .. } => "review_approved",
            Notification::BdIssued { .. } => "bd_issued",
        }
    }

    /// One-line human rendering, used by the admin webhook.
    pub fn summary(&self) -> String {
        match self {
            Notification::StarAward { delta, message } => {
                format!("+{delta} STAR: {message}")
            }
            Notification::RewardUpdate {
                category,
                trigger,
                xp,
                stars,
            } => format!("{category}:{trigger} earned {xp} XP, {stars} STAR"),
            Notification::MemberActivity {
                member_id,
                activity,
                xp,
                stars,
            } => format!("{member_id} did {activity} ({xp} XP, {stars} STAR)"),
            Notification::ReviewApproved { stars } => {
                format!("video review approved, +{stars} STAR")
            }
            Notification::BdIssued { amount, reason } => {
                format!("+{amount} BD issued: {reason}")
            }
        }
    }
}

/// A notifications-table row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredNotification {
    pub id: i64,
    pub member_id: String,
    pub category: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
