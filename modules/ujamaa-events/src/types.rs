//! Row types for the event tables, plus the tagged activity payload enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ujamaa_common::UjamaaError;

/// A share_events row. `awarded` is the consumption marker owned by the
/// reconciliation engine; it flips FALSE -> TRUE exactly once.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShareEvent {
    pub id: i64,
    pub member_id: String,
    pub platform: String,
    pub share_url: Option<String>,
    pub proof_url: Option<String>,
    pub awarded: bool,
    pub created_at: DateTime<Utc>,
}

/// One reconciliation candidate: a member with enough unawarded shares.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingShares {
    pub member_id: String,
    pub unawarded: i64,
}

/// Activity payloads, serialized into activity_events.payload with a serde
/// tag. Each variant maps onto a (category, trigger) pair in reward_rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    WorkoutComplete { workout: String, duration_mins: i32 },
    WaterLog { glasses: i32 },
    JournalEntry { word_count: i32 },
    StudyShareCompleted { resource: String },
    DailyPracticeComplete { language: String, streak_days: i32 },
}

impl ActivityEvent {
    pub fn category(&self) -> &'static str {
        match self {
            ActivityEvent::WorkoutComplete { .. } | ActivityEvent::WaterLog { .. } => "fitness",
            ActivityEvent::JournalEntry { .. } | ActivityEvent::StudyShareCompleted { .. } => {
                "study"
            }
            ActivityEvent::DailyPracticeComplete { .. } => "language",
        }
    }

    pub fn trigger(&self) -> &'static str {
        match self {
            ActivityEvent::WorkoutComplete { .. } => "workout_complete",
            ActivityEvent::WaterLog { .. } => "water_log",
            ActivityEvent::JournalEntry { .. } => "journal_entry",
            ActivityEvent::StudyShareCompleted { .. } => "share_completed",
            ActivityEvent::DailyPracticeComplete { .. } => "daily_practice_complete",
        }
    }

    /// The event_type column value, `category:trigger`.
    pub fn event_type_str(&self) -> String {
        format!("{}:{}", self.category(), self.trigger())
    }
}

/// An activity_events row as stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredActivity {
    pub id: i64,
    pub member_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// --- Video reviews ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "pending"),
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = UjamaaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(UjamaaError::Validation(format!(
                "unknown review status: {other}"
            ))),
        }
    }
}

/// A video_reviews row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VideoReview {
    pub id: i64,
    pub member_id: String,
    pub business_name: String,
    pub business_address: String,
    pub service_type: String,
    pub what_makes_special: String,
    pub video_url: String,
    pub self_score: i32,
    pub checklist: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl VideoReview {
    pub fn status(&self) -> ReviewStatus {
        self.status.parse().unwrap_or(ReviewStatus::Pending)
    }
}

/// A review submission. The store assigns id/status/timestamps.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub member_id: String,
    pub business_name: String,
    pub business_address: String,
    pub service_type: String,
    pub what_makes_special: String,
    pub video_url: String,
    pub self_score: i32,
    pub checklist: serde_json::Value,
}

// --- AI metrics ---

/// The metric kinds the AI pipeline reports. Scores are opaque numbers from
/// models that live outside this system; only the thresholds are ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Motion,
    Voice,
    Journal,
}

impl MetricKind {
    /// Score at or above this earns the `ai:{kind}_high` reward.
    pub fn threshold(&self) -> f64 {
        match self {
            MetricKind::Motion => 75.0,
            MetricKind::Voice => 70.0,
            MetricKind::Journal => 30.0,
        }
    }

    /// Trigger name in the `ai` reward category.
    pub fn high_trigger(&self) -> &'static str {
        match self {
            MetricKind::Motion => "motion_high",
            MetricKind::Voice => "voice_high",
            MetricKind::Journal => "journal_high",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Motion => write!(f, "motion"),
            MetricKind::Voice => write!(f, "voice"),
            MetricKind::Journal => write!(f, "journal"),
        }
    }
}

/// An ai_metrics row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AiMetric {
    pub id: i64,
    pub member_id: String,
    pub metric_type: String,
    pub score: f64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
