use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Sessions that are currently signed in. A token is only honoured while its
/// session id is registered here, so logging out revokes it immediately.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn start(&self, user_id: Uuid, ttl: Duration) -> Uuid {
        let session_id = Uuid::new_v4();
        let record = SessionRecord {
            user_id,
            expires_at: Utc::now() + ttl,
        };
        self.sessions.write().await.insert(session_id, record);
        session_id
    }

    /// Drops expired sessions and returns their ids so owned resources can
    /// be released.
    pub async fn prune_expired(&self) -> Vec<Uuid> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, record)| record.expires_at <= now)
            .map(|(session_id, _)| *session_id)
            .collect();
        for session_id in &expired {
            sessions.remove(session_id);
        }
        expired
    }

    pub async fn is_active(&self, session_id: Uuid, user_id: Uuid) -> bool {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .is_some_and(|record| record.user_id == user_id && record.expires_at > Utc::now())
    }

    pub async fn end(&self, session_id: Uuid) -> Option<SessionRecord> {
        self.sessions.write().await.remove(&session_id)
    }

    pub async fn active_count(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|record| record.expires_at > now)
            .count()
    }
}
