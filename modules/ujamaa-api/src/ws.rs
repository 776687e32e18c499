//! Live notification stream. Each connection registers a session in the
//! registry; the registry sink pushes serialized notification frames down
//! the channel and this task forwards them onto the socket.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info};

use ujamaa_common::Role;

use crate::auth::{bearer_token, unauthorized};
use crate::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    // Browsers can't set Authorization on websocket requests, so the token
    // may ride in the query string instead.
    token: Option<String>,
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = query.token.as_deref().or_else(|| bearer_token(&headers)) else {
        return unauthorized("Missing bearer token");
    };

    let claims = match state.jwt.verify_token(token) {
        Ok(claims) => claims,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    let member = match state.members.upsert(&claims.identity()).await {
        Ok(member) => member,
        Err(e) => {
            error!(error = %e, "Member upsert failed during websocket auth");
            return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let role = if member.is_admin() {
        Role::Admin
    } else {
        Role::User
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, member.member_id, role))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, member_id: String, role: Role) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let session_id = state.registry.connect(&member_id, role, tx).await;
    info!(member_id = member_id.as_str(), "WebSocket session opened");

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Inbound frames carry nothing we act on
                Some(Ok(_)) => {}
            },
        }
    }

    state.registry.disconnect(&member_id, session_id).await;
    info!(member_id = member_id.as_str(), "WebSocket session closed");
}
