//! Session trait: per-user conversation state owned by the HTTP layer.
//!
//! Sessions are handed out as shared, individually locked handles. Holding a
//! handle's lock across "read history → answer → append turns" serializes
//! concurrent requests from the same session without blocking other sessions.
//! The session id and owner never change, so handles carry them outside the
//! lock and authentication never waits on an in-flight answer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::message::ConversationTurn;

/// An authenticated session and its accumulated conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier (also the cookie value)
    pub id: String,

    /// The authenticated identity
    pub user_email: String,

    /// When the session was opened
    pub created_at: DateTime<Utc>,

    /// Ordered conversation turns
    pub turns: Vec<ConversationTurn>,
}

impl Session {
    /// Open a new empty session for `user_email` with a random id.
    pub fn new(user_email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_email: user_email.into(),
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }

    /// A copy of the history as it stands before the next exchange.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.turns.clone()
    }

    /// Append a turn.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Drop all turns but keep the session open.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// A shared, individually lockable session.
///
/// Clones refer to the same session. `id` and `user_email` are readable
/// without taking the lock.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Arc<str>,
    user_email: Arc<str>,
    state: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            id: Arc::from(session.id.as_str()),
            user_email: Arc::from(session.user_email.as_str()),
            state: Arc::new(Mutex::new(session)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Wait for exclusive access to the session's turns.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().await
    }

    /// Whether both handles refer to the same live session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// The session store injected into the HTTP layer.
///
/// Implementations: in-memory (bounded). Any backend must hand out the same
/// handle for the same id while the session is live.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "memory").
    fn name(&self) -> &str;

    /// Open a session for an authenticated user.
    async fn create(&self, user_email: &str) -> std::result::Result<SessionHandle, StoreError>;

    /// Look up a live session.
    async fn get(&self, id: &str) -> std::result::Result<Option<SessionHandle>, StoreError>;

    /// Close a session, returning its final state.
    async fn remove(&self, id: &str) -> std::result::Result<Option<Session>, StoreError>;

    /// Number of live sessions.
    async fn count(&self) -> std::result::Result<usize, StoreError>;

    /// Snapshot of a session's history.
    async fn history(&self, id: &str) -> std::result::Result<Vec<ConversationTurn>, StoreError> {
        let handle = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        let session = handle.lock().await;
        Ok(session.history())
    }

    /// Append turns to a session's history.
    async fn append(
        &self,
        id: &str,
        turns: Vec<ConversationTurn>,
    ) -> std::result::Result<(), StoreError> {
        let handle = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        let mut session = handle.lock().await;
        session.turns.extend(turns);
        Ok(())
    }

    /// Clear a session's history.
    async fn clear(&self, id: &str) -> std::result::Result<(), StoreError> {
        let handle = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        handle.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_have_distinct_ids() {
        let a = Session::new("prof@tcm.org");
        let b = Session::new("prof@tcm.org");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert!(a.turns.is_empty());
    }

    #[tokio::test]
    async fn handle_identity_is_readable_while_locked() {
        let handle = SessionHandle::new(Session::new("prof@tcm.org"));
        let other = handle.clone();

        let guard = handle.lock().await;
        assert_eq!(other.user_email(), "prof@tcm.org");
        assert_eq!(other.id(), guard.id);
        assert!(other.same_session(&handle));
        drop(guard);

        assert!(!handle.same_session(&SessionHandle::new(Session::new("prof@tcm.org"))));
    }

    #[test]
    fn history_is_a_snapshot() {
        let mut session = Session::new("regular@tcm.org");
        session.push(ConversationTurn::user("first"));
        let snapshot = session.history();
        session.push(ConversationTurn::assistant("reply", vec![]));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.turns.len(), 2);

        session.clear();
        assert!(session.turns.is_empty());
    }
}
