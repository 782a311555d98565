//! Bounded in-memory session store.
//!
//! Sessions live in a map keyed by id. When the store is full, the oldest
//! session is evicted to make room for a new login.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use shanghan_core::error::StoreError;
use shanghan_core::session::{Session, SessionHandle, SessionStore};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionHandle>,
    /// Creation order, oldest first
    order: VecDeque<String>,
}

/// In-memory, capacity-bounded session store.
pub struct InMemorySessionStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl InMemorySessionStore {
    /// Create a store holding at most `capacity` live sessions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, user_email: &str) -> Result<SessionHandle, StoreError> {
        let handle = SessionHandle::new(Session::new(user_email));
        let id = handle.id().to_string();

        let mut inner = self.inner.write().await;
        while inner.sessions.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if inner.sessions.remove(&oldest).is_some() {
                info!(session = %oldest, "Evicted oldest session (store full)");
            }
        }
        inner.sessions.insert(id.clone(), handle.clone());
        inner.order.push_back(id.clone());

        debug!(session = %id, user = %user_email, "Session created");
        Ok(handle)
    }

    async fn get(&self, id: &str) -> Result<Option<SessionHandle>, StoreError> {
        Ok(self.inner.read().await.sessions.get(id).cloned())
    }

    async fn remove(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let handle = {
            let mut inner = self.inner.write().await;
            let handle = inner.sessions.remove(id);
            if handle.is_some() {
                inner.order.retain(|existing| existing != id);
            }
            handle
        };

        match handle {
            Some(handle) => {
                let session = handle.lock().await.clone();
                debug!(session = %id, "Session removed");
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.sessions.len())
    }
}
