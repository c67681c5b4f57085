//! Session Management
//!
//! In-memory conversations keyed by id, for session boundaries that carry a
//! dialogue across several requests. Nothing survives a process restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::message::Conversation;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation plus bookkeeping
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, conversation: Conversation) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the history with the result of a successful run
    pub fn commit(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        self.touch();
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

/// Shared handle; holding the lock gives a run exclusive use of the session
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session, creating it with `seed` when absent
    pub async fn get_or_create(
        &self,
        id: Option<SessionId>,
        seed: impl FnOnce() -> Conversation,
    ) -> SessionHandle {
        let id = id.unwrap_or_default();

        if let Some(handle) = self.sessions.read().await.get(&id) {
            return handle.clone();
        }

        self.sessions
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id, seed()))))
            .clone()
    }

    /// Get a session by ID
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Forget a session; true when it existed
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check if empty
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn test_get_or_create_reuses_session() {
        let store = MemorySessionStore::new();
        let id = SessionId::from_string("abc");

        let first = store
            .get_or_create(Some(id.clone()), || Conversation::with_system_prompt("sys"))
            .await;
        first.lock().await.conversation.append(Message::user("hi")).unwrap();

        let second = store
            .get_or_create(Some(id.clone()), || panic!("should not seed twice"))
            .await;
        assert_eq!(second.lock().await.message_count(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_fresh_ids_and_removal() {
        let store = MemorySessionStore::new();
        let handle = store.get_or_create(None, Conversation::new).await;
        let id = handle.lock().await.id.clone();

        assert!(store.get(&id).await.is_some());
        assert!(store.remove(&id).await);
        assert!(!store.remove(&id).await);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_commit_replaces_history() {
        let mut session = Session::new(SessionId::new(), Conversation::with_system_prompt("sys"));
        let mut next = session.conversation.clone();
        next.append(Message::user("hello")).unwrap();

        session.commit(next);
        assert_eq!(session.message_count(), 2);
        assert!(session.updated_at >= session.created_at);
    }
}
