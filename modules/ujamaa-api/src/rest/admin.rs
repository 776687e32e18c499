//! Admin-only routes: platform overview, member and share listings, the
//! review queue, BD issuance, and role changes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use ujamaa_common::{Currency, Result, Role};
use ujamaa_events::{ReviewStore, VideoReview};
use ujamaa_ledger::LedgerStore;
use ujamaa_notify::Notification;

use crate::auth::AdminMember;
use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// GET /admin/overview. The member count is the primary read; the rest are
/// best-effort gauges that default to zero rather than failing the page.
pub async fn overview(State(state): State<Arc<AppState>>, _admin: AdminMember) -> Response {
    let members = match state.members.count().await {
        Ok(count) => count,
        Err(e) => return error_response(e),
    };

    let star = state.ledger.circulation(Currency::Star).await.unwrap_or(0);
    let bd = state.ledger.circulation(Currency::Bd).await.unwrap_or(0);
    let xp = state.ledger.circulation(Currency::Xp).await.unwrap_or(0);
    let pending_reviews = state.reviews.pending_count().await.unwrap_or(0);
    let unawarded_shares = state.events.unawarded_total().await.unwrap_or(0);

    Json(serde_json::json!({
        "members": members,
        "circulation": {"star": star, "bd": bd, "xp": xp},
        "pending_reviews": pending_reviews,
        "unawarded_shares": unawarded_shares,
    }))
    .into_response()
}

/// GET /admin/members.
pub async fn members(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(100).min(500);
    match state.members.list(limit).await {
        Ok(members) => Json(serde_json::json!({"members": members})).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /admin/members/{id}. One member with balances and recent history,
/// the drill-down behind a row in the members table.
pub async fn member_detail(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Path(member_id): Path<String>,
) -> Response {
    let member = match state.members.require(&member_id).await {
        Ok(member) => member,
        Err(e) => return error_response(e),
    };

    let balances = match state.ledger.balances(&member_id).await {
        Ok(balances) => balances,
        Err(e) => return error_response(e),
    };

    let shares = state.events.shares_for_member(&member_id, 10).await.unwrap_or_default();
    let activity = state.events.recent_activity(&member_id, 10).await.unwrap_or_default();
    let reviews = state.reviews.list_for_member(&member_id, 10).await.unwrap_or_default();

    Json(serde_json::json!({
        "member": member,
        "balances": balances,
        "shares": shares,
        "activity": activity,
        "reviews": reviews,
    }))
    .into_response()
}

/// GET /admin/shares.
pub async fn shares(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(50).min(200);
    match state.events.recent_shares(limit).await {
        Ok(shares) => Json(serde_json::json!({"shares": shares})).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /admin/reviews. Pending queue, oldest first.
pub async fn reviews(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(50).min(200);
    match state.reviews.list_pending(limit).await {
        Ok(reviews) => Json(serde_json::json!({"reviews": reviews})).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /admin/activity-stream. Recent transactions merged across all three
/// currencies, newest first.
pub async fn activity_stream(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(100).min(200);
    match state.ledger.recent_entries(limit).await {
        Ok(entries) => Json(serde_json::json!({"entries": entries})).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /admin/rules. The reward rule table as currently loaded.
pub async fn rules(State(state): State<Arc<AppState>>, _admin: AdminMember) -> Response {
    match state.rules.all().await {
        Ok(rules) => Json(serde_json::json!({"rules": rules})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub stars: Option<i64>,
}

/// POST /admin/reviews/{id}/approve. Flips the status and appends the STAR
/// payout in one transaction; the body may override the self score.
pub async fn approve_review(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Path(id): Path<i64>,
    body: Option<Json<ApproveRequest>>,
) -> Response {
    let stars_override = body.and_then(|Json(req)| req.stars);
    if stars_override.is_some_and(|stars| stars < 0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "stars must be non-negative"})),
        )
            .into_response();
    }

    let (review, stars) = match approve_and_award(&state, id, stars_override).await {
        Ok(result) => result,
        Err(e) => return error_response(e),
    };

    let notice = Notification::ReviewApproved { stars };
    if let Err(e) = state.notifier.send(&review.member_id, &notice).await {
        warn!(error = %e, member_id = review.member_id.as_str(), "Failed to notify review approval");
    }

    Json(serde_json::json!({"review": review, "stars": stars})).into_response()
}

async fn approve_and_award(
    state: &AppState,
    id: i64,
    stars_override: Option<i64>,
) -> Result<(VideoReview, i64)> {
    let mut tx = state.ledger.pool().begin().await?;

    let review = ReviewStore::approve_in(&mut tx, id).await?;
    let stars = stars_override.unwrap_or(review.self_score as i64);
    if stars > 0 {
        LedgerStore::append_in(
            &mut tx,
            Currency::Star,
            &review.member_id,
            stars,
            "video_review:approved",
        )
        .await?;
    }

    tx.commit().await?;
    Ok((review, stars))
}

/// POST /admin/reviews/{id}/reject.
pub async fn reject_review(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Path(id): Path<i64>,
) -> Response {
    match state.reviews.reject(id).await {
        Ok(review) => Json(serde_json::json!({"review": review})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct IssueBdRequest {
    pub member_id: String,
    pub amount: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /admin/issue-bd. Black Dollars enter circulation only here.
pub async fn issue_bd(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Json(body): Json<IssueBdRequest>,
) -> Response {
    if body.amount <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "amount must be positive"})),
        )
            .into_response();
    }

    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("admin_issue")
        .to_string();

    if let Err(e) = state.members.require(&body.member_id).await {
        return error_response(e);
    }

    let entry = match state
        .ledger
        .append(Currency::Bd, &body.member_id, body.amount, &reason)
        .await
    {
        Ok(entry) => entry,
        Err(e) => return error_response(e),
    };

    let notice = Notification::BdIssued {
        amount: body.amount,
        reason,
    };
    if let Err(e) = state.notifier.send(&body.member_id, &notice).await {
        warn!(error = %e, member_id = body.member_id.as_str(), "Failed to notify BD issue");
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({"entry": entry})),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// POST /admin/members/{id}/role.
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    _admin: AdminMember,
    Path(member_id): Path<String>,
    Json(body): Json<RoleRequest>,
) -> Response {
    let role = match body.role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => return error_response(e),
    };

    match state.members.set_role(&member_id, role).await {
        Ok(()) => Json(serde_json::json!({"ok": true})).into_response(),
        Err(e) => error_response(e),
    }
}
