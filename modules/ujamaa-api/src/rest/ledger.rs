//! Share submissions, video reviews, and the balance/rank reads.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use ujamaa_common::SharePlatform;
use ujamaa_events::NewReview;

use crate::auth::AuthedMember;
use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct ShareRequest {
    pub platform: String,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub proof_url: Option<String>,
}

/// POST /ledger/share. Records the event only; STAR conversion happens in
/// the reconciliation pass, never here.
pub async fn submit_share(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(body): Json<ShareRequest>,
) -> Response {
    let platform = body
        .platform
        .parse::<SharePlatform>()
        .unwrap_or(SharePlatform::Other);

    match state
        .events
        .append_share(
            &member.member_id,
            platform,
            body.share_url.as_deref(),
            body.proof_url.as_deref(),
        )
        .await
    {
        Ok(event) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"share": event})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub business_name: String,
    #[serde(default)]
    pub business_address: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub what_makes_special: String,
    pub video_url: String,
    #[serde(default)]
    pub checklist: serde_json::Value,
}

/// POST /ledger/review-video. The self score is derived from the checklist,
/// not client-supplied; an admin can still override it at approval time.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(body): Json<ReviewRequest>,
) -> Response {
    if body.business_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "business_name is required"})),
        )
            .into_response();
    }
    if body.video_url.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "video_url is required"})),
        )
            .into_response();
    }

    let self_score = checklist_score(&body.checklist);
    let checklist = if body.checklist.is_null() {
        serde_json::json!({})
    } else {
        body.checklist
    };

    let review = NewReview {
        member_id: member.member_id,
        business_name: body.business_name,
        business_address: body.business_address,
        service_type: body.service_type,
        what_makes_special: body.what_makes_special,
        video_url: body.video_url,
        self_score,
        checklist,
    };

    match state.reviews.submit(review).await {
        Ok(stored) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"review": stored})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /ledger/balance.
pub async fn balance(State(state): State<Arc<AppState>>, member: AuthedMember) -> Response {
    match state.ledger.balances(&member.member_id).await {
        Ok(balances) => Json(balances).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /ledger/rank. Summed fresh from the ledger rather than served from
/// the cached columns, so a member sees promotions immediately.
pub async fn rank(State(state): State<Arc<AppState>>, member: AuthedMember) -> Response {
    match state.ledger.rank(&member.member_id).await {
        Ok((total, tier)) => Json(serde_json::json!({
            "star_total": total,
            "rank": tier.to_string(),
            "title": tier.title(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Count of checklist flags the member marked true.
fn checklist_score(checklist: &serde_json::Value) -> i32 {
    checklist
        .as_object()
        .map(|map| map.values().filter(|v| v.as_bool() == Some(true)).count() as i32)
        .unwrap_or(0)
}
