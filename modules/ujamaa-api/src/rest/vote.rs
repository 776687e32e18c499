//! Contest voting.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use ujamaa_ledger::PayWith;

use crate::auth::AuthedMember;
use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct VoteRequest {
    pub contest_id: String,
    pub contestant_id: String,
    pub votes: i32,
    pub pay_with: PayWith,
}

/// POST /pagt/vote. The store enforces the balance check and the vote-count
/// floor, so a failed cast comes back as a 400 with nothing written.
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    member: AuthedMember,
    Json(body): Json<VoteRequest>,
) -> Response {
    match state
        .votes
        .cast(
            &member.member_id,
            &body.contest_id,
            &body.contestant_id,
            body.votes,
            body.pay_with,
        )
        .await
    {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"receipt": receipt})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
