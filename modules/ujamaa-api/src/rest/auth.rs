//! Login and profile routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, warn};

use crate::auth::{unauthorized, AuthedMember};
use crate::rest::error_response;
use crate::AppState;

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// POST /auth/google. Exchange a Google ID token for a session token. The
/// member row is created on first login and refreshed on every one after.
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GoogleLoginRequest>,
) -> Response {
    let Some(google) = &state.google else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "Google login not configured"})),
        )
            .into_response();
    };

    let profile = match google.verify(&body.id_token).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "Google token verification failed");
            return unauthorized("Google token verification failed");
        }
    };

    let token = match state.jwt.issue_token(
        "google",
        &profile.sub,
        profile.name.as_deref(),
        profile.email.as_deref(),
        profile.picture.as_deref(),
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Token creation failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // The upsert also happens on every authed request; doing it here lets
    // the login response carry the member row.
    let claims = match state.jwt.verify_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            error!(error = %e, "Fresh token failed verification");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let member = match state.members.upsert(&claims.identity()).await {
        Ok(member) => member,
        Err(e) => return error_response(e),
    };

    Json(serde_json::json!({"token": token, "member": member})).into_response()
}

/// GET /auth/me. The caller's member row and balances.
pub async fn me(State(state): State<Arc<AppState>>, member: AuthedMember) -> Response {
    let row = match state.members.require(&member.member_id).await {
        Ok(row) => row,
        Err(e) => return error_response(e),
    };

    let balances = match state.ledger.balances(&member.member_id).await {
        Ok(balances) => balances,
        Err(e) => return error_response(e),
    };

    Json(serde_json::json!({"member": row, "balances": balances})).into_response()
}
