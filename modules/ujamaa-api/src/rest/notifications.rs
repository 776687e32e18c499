//! Notification inbox reads.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::auth::AuthedMember;
use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// GET /notifications.
pub async fn list(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(50).min(200);

    let items = match state.inbox.list(&member.member_id, limit).await {
        Ok(items) => items,
        Err(e) => return error_response(e),
    };

    // The unread counter is cosmetic; don't fail the list over it.
    let unread = match state.inbox.unread_count(&member.member_id).await {
        Ok(unread) => unread,
        Err(e) => {
            warn!(error = %e, "Failed to count unread notifications");
            0
        }
    };

    Json(serde_json::json!({"notifications": items, "unread": unread})).into_response()
}

/// POST /notifications/read/{id}.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Path(id): Path<i64>,
) -> Response {
    match state.inbox.mark_read(&member.member_id, id).await {
        Ok(()) => Json(serde_json::json!({"ok": true})).into_response(),
        Err(e) => error_response(e),
    }
}
