//! Session storage.
//!
//! Handlers only see the [`SessionStore`] trait. Sessions never expire;
//! they live until logout or process restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Opaque bearer token handed to the client in the `session` query parameter
pub type SessionId = String;

/// A logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Session backend unavailable: {0}")]
    Unavailable(String),
}

pub type SessionResult<T> = Result<T, SessionStoreError>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create and remember a new session for `username`.
    async fn create(&self, username: &str) -> SessionResult<Session>;

    /// Look up a session. Unknown and deleted ids yield `None`.
    async fn get(&self, id: &str) -> SessionResult<Option<Session>>;

    /// Forget a session. Returns whether one was removed; deleting an
    /// unknown id is not an error.
    async fn delete(&self, id: &str) -> SessionResult<bool>;
}

/// 128 bits from the thread-local CSPRNG, hex encoded.
pub fn generate_session_id() -> SessionId {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Process-local session map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, username: &str) -> SessionResult<Session> {
        let mut sessions = self.sessions.write().await;

        let id = loop {
            let candidate = generate_session_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session {
            id: id.clone(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        sessions.insert(id, session.clone());

        debug!("Created session for {}", username);
        Ok(session)
    }

    async fn get(&self, id: &str) -> SessionResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> SessionResult<bool> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        if removed {
            debug!("Deleted session");
        }
        Ok(removed)
    }
}
