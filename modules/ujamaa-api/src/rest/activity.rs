//! Activity intake routes. Each one stores the raw event, then runs the
//! reward engine for its (category, trigger) and echoes what was paid out.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use ujamaa_events::{ActivityEvent, MetricKind};
use ujamaa_rewards::Grant;

use crate::auth::AuthedMember;
use crate::rest::error_response;
use crate::AppState;

/// Store an activity event and grant its reward. Each route allows only the
/// event types that belong to it, so a fitness payload can't ride in through
/// the study endpoint.
async fn log_activity(
    state: Arc<AppState>,
    member: AuthedMember,
    event: ActivityEvent,
    allowed: &[&str],
) -> Response {
    let event_type = event.event_type_str();
    if !allowed.contains(&event_type.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("event type {event_type} not accepted here")
            })),
        )
            .into_response();
    }

    if let Err(e) = state.events.append_activity(&member.member_id, &event).await {
        return error_response(e);
    }

    match state
        .engine
        .grant(&member.member_id, event.category(), event.trigger())
        .await
    {
        Ok(grant) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "event_type": event_type,
                "xp": grant.xp,
                "stars": grant.stars,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /fitness/log.
pub async fn fitness_log(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(event): Json<ActivityEvent>,
) -> Response {
    log_activity(
        state,
        member,
        event,
        &["fitness:workout_complete", "fitness:water_log"],
    )
    .await
}

/// POST /study/journal.
pub async fn study_journal(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(event): Json<ActivityEvent>,
) -> Response {
    log_activity(state, member, event, &["study:journal_entry"]).await
}

/// POST /study/share.
pub async fn study_share(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(event): Json<ActivityEvent>,
) -> Response {
    log_activity(state, member, event, &["study:share_completed"]).await
}

/// POST /language/practice.
pub async fn language_practice(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(event): Json<ActivityEvent>,
) -> Response {
    log_activity(state, member, event, &["language:daily_practice_complete"]).await
}

#[derive(Deserialize)]
pub struct MetricRequest {
    pub metric: MetricKind,
    pub score: f64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// POST /ai/metric. Stores the score either way; only a score at or above
/// the metric's threshold earns the `ai` category reward.
pub async fn ai_metric(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(body): Json<MetricRequest>,
) -> Response {
    if !body.score.is_finite() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "score must be a finite number"})),
        )
            .into_response();
    }

    let recorded = match state
        .metrics
        .record(&member.member_id, body.metric, body.score, body.metadata)
        .await
    {
        Ok(recorded) => recorded,
        Err(e) => return error_response(e),
    };

    let high = body.score >= body.metric.threshold();
    let grant = if high {
        match state
            .engine
            .grant(&member.member_id, "ai", body.metric.high_trigger())
            .await
        {
            Ok(grant) => grant,
            Err(e) => return error_response(e),
        }
    } else {
        Grant::default()
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "metric": recorded,
            "high": high,
            "xp": grant.xp,
            "stars": grant.stars,
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub metric: MetricKind,
    pub limit: Option<u32>,
}

/// GET /ai/history. The caller's recent scores for one metric.
pub async fn ai_history(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(20).min(100);
    match state
        .metrics
        .latest(&member.member_id, query.metric, limit)
        .await
    {
        Ok(metrics) => Json(serde_json::json!({"metrics": metrics})).into_response(),
        Err(e) => error_response(e),
    }
}
