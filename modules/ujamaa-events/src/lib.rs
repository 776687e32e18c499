//! Raw event intake: share events with their consumption marker, activity
//! events, video review submissions, and AI metric scores.
//!
//! Nothing in this crate touches the currency ledgers. Share rewards are
//! applied later by the reconciliation engine; activity rewards are granted
//! by the caller right after the append.

pub mod log;
pub mod metrics;
pub mod reviews;
pub mod types;

pub use log::EventLog;
pub use metrics::AiMetricStore;
pub use reviews::ReviewStore;
pub use types::{
    ActivityEvent, AiMetric, MetricKind, NewReview, PendingShares, ReviewStatus, ShareEvent,
    StoredActivity, VideoReview,
};
