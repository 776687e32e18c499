use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use ujamaa_common::Role;

use crate::AppState;

/// The authenticated member on a request. Extracting this verifies the
/// bearer token and upserts the member row, so every authenticated call
/// doubles as login-on-use.
pub struct AuthedMember {
    pub member_id: String,
    pub role: Role,
}

impl FromRequestParts<Arc<AppState>> for AuthedMember {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(unauthorized("Missing bearer token"));
        };

        let claims = match state.jwt.verify_token(token) {
            Ok(claims) => claims,
            Err(_) => return Err(unauthorized("Invalid or expired token")),
        };

        let member = match state.members.upsert(&claims.identity()).await {
            Ok(member) => member,
            Err(e) => {
                error!(error = %e, "Member upsert failed during auth");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        let role = member.role.parse().unwrap_or(Role::User);
        Ok(AuthedMember {
            member_id: member.member_id,
            role,
        })
    }
}

/// An authenticated member whose role is admin. Extraction fails with 403
/// for everyone else.
pub struct AdminMember(pub AuthedMember);

impl FromRequestParts<Arc<AppState>> for AdminMember {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let member = AuthedMember::from_request_parts(parts, state).await?;
        if member.role != Role::Admin {
            return Err((
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Admin role required"})),
            )
                .into_response());
        }
        Ok(AdminMember(member))
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_strips_the_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
