//! Persistence contract and the in-memory reference store.

use std::collections::HashMap;

use async_trait::async_trait;
use chatstream_core::{ChatMessage, ChatSession, SessionId, UserId};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by the persistence collaborator.
///
/// These propagate as explicit failures: losing a completed message is a
/// correctness issue, not a streaming hiccup.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Session does not exist.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Backend storage failure.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Contract for the on-device persistence collaborator.
///
/// Records are keyed by the generated ids; the storage schema is the
/// collaborator's concern.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message. Idempotent for an identical id.
    async fn persist_message(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Messages of a session in creation order.
    async fn list_session_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// All sessions for the current user.
    async fn list_sessions(&self) -> Result<Vec<ChatSession>, StoreError>;

    /// Allocate a new session for the given user.
    async fn create_session(&self, user_id: &UserId) -> Result<ChatSession, StoreError>;

    /// Delete all locally owned sessions and messages. Irreversible.
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// In-memory store used as the default on-device cache and in tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    sessions: HashMap<SessionId, ChatSession>,
    messages: HashMap<SessionId, Vec<ChatMessage>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn persist_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let session = inner
            .sessions
            .get_mut(&message.session_id)
            .ok_or_else(|| StoreError::SessionNotFound(message.session_id.to_string()))?;

        let messages = inner.messages.entry(message.session_id.clone()).or_default();
        if messages.iter().any(|m| m.id == message.id) {
            return Ok(());
        }

        messages.push(message.clone());
        session.record_message(message.timestamp);
        Ok(())
    }

    async fn list_session_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.sessions.contains_key(session_id) {
            return Err(StoreError::SessionNotFound(session_id.to_string()));
        }
        Ok(inner.messages.get(session_id).cloned().unwrap_or_default())
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, StoreError> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<ChatSession> = inner.sessions.values().cloned().collect();
        // Most recently updated first.
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn create_session(&self, user_id: &UserId) -> Result<ChatSession, StoreError> {
        let session = ChatSession::new(user_id.clone());
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.sessions.clear();
        inner.messages.clear();
        Ok(())
    }
}
