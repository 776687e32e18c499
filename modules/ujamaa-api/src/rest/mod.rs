use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::error;
use ujamaa_common::UjamaaError;

pub mod activity;
pub mod admin;
pub mod auth;
pub mod ledger;
pub mod notifications;
pub mod vote;

/// Map store and engine errors onto HTTP responses. Caller mistakes come
/// back as structured JSON; anything else is logged and hidden behind a 500.
pub(crate) fn error_response(e: UjamaaError) -> Response {
    match e {
        UjamaaError::Validation(_) | UjamaaError::InsufficientFunds { .. } => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
        UjamaaError::UnknownMember(_) | UjamaaError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
        other => {
            error!(error = %other, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
