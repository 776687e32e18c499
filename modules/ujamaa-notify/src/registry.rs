//! In-process registry of live websocket sessions.
//!
//! The websocket layer owns connect/disconnect; everything else only sees the
//! NotifySink impl. A member with no open session is simply unreachable and
//! delivery is a silent no-op.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use ujamaa_common::Role;
use uuid::Uuid;

use crate::sink::NotifySink;
use crate::types::Notification;

struct Session {
    id: Uuid,
    role: Role,
    tx: mpsc::UnboundedSender<String>,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Vec<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session. A member can hold several (multiple tabs);
    /// each gets every frame. Returns the id to hand back to `disconnect`.
    pub async fn connect(
        &self,
        member_id: &str,
        role: Role,
        tx: mpsc::UnboundedSender<String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(member_id.to_string())
            .or_default()
            .push(Session { id, role, tx });
        id
    }

    pub async fn disconnect(&self, member_id: &str, session_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(list) = sessions.get_mut(member_id) {
            list.retain(|s| s.id != session_id);
            if list.is_empty() {
                sessions.remove(member_id);
            }
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.values().map(Vec::len).sum()
    }

    /// Push a frame to every session in the list, dropping sessions whose
    /// receiver has gone away.
    fn push_all(list: &mut Vec<Session>, frame: &str) {
        list.retain(|s| s.tx.send(frame.to_string()).is_ok());
    }
}

#[async_trait]
impl NotifySink for SessionRegistry {
    async fn send(&self, member_id: &str, notification: &Notification) -> anyhow::Result<()> {
        let frame = serde_json::to_string(notification)?;
        let mut sessions = self.sessions.write().await;
        if let Some(list) = sessions.get_mut(member_id) {
            Self::push_all(list, &frame);
            if list.is_empty() {
                sessions.remove(member_id);
            }
        }
        Ok(())
    }

    async fn broadcast(&self, role: Role, notification: &Notification) -> anyhow::Result<()> {
        let frame = serde_json::to_string(notification)?;
        let mut sessions = self.sessions.write().await;
        for list in sessions.values_mut() {
            list.retain(|s| s.role != role || s.tx.send(frame.clone()).is_ok());
        }
        sessions.retain(|_, list| !list.is_empty());
        Ok(())
    }
}
