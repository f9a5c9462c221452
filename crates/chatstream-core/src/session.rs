//! Chat session lifecycle and bookkeeping.

use crate::ids::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation session owning a sequence of messages.
///
/// Sessions are created when a conversation starts, mutated as messages
/// arrive, and deleted only by an explicit bulk clear. `updated_at` never
/// decreases; `message_count` mirrors the number of persisted messages
/// under the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier, sortable by creation time.
    pub id: SessionId,
    /// User owning this session.
    pub user_id: UserId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the last message was recorded, if any.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Display title, absent until set.
    pub title: Option<String>,
    /// Number of messages persisted under this session.
    pub message_count: u64,
}

impl ChatSession {
    /// Create a new session with a fresh id.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id,
            created_at: now,
            updated_at: now,
            last_message_at: None,
            title: None,
            message_count: 0,
        }
    }

    /// Account for one persisted message.
    pub fn record_message(&mut self, at: DateTime<Utc>) {
        self.message_count += 1;
        self.last_message_at = Some(at);
        self.bump_updated(at);
    }

    /// Set the display title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
        self.bump_updated(Utc::now());
    }

    /// Mark the session as touched without other changes.
    pub fn touch(&mut self) {
        self.bump_updated(Utc::now());
    }

    // updated_at is monotonic even if callers hand in stale timestamps.
    fn bump_updated(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session() {
        let session = ChatSession::new(UserId::new("user-1"));
        assert_eq!(session.message_count, 0);
        assert!(session.last_message_at.is_none());
        assert!(session.title.is_none());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_record_message_updates_counters() {
        let mut session = ChatSession::new(UserId::new("user-1"));
        let at = Utc::now() + Duration::milliseconds(5);

        session.record_message(at);
        session.record_message(at + Duration::milliseconds(5));

        assert_eq!(session.message_count, 2);
        assert_eq!(
            session.last_message_at,
            Some(at + Duration::milliseconds(5))
        );
        assert!(session.updated_at >= at);
    }

    #[test]
    fn test_updated_at_never_decreases() {
        let mut session = ChatSession::new(UserId::new("user-1"));
        let before = session.updated_at;

        session.record_message(before - Duration::seconds(60));

        assert_eq!(session.message_count, 1);
        assert_eq!(session.updated_at, before);
    }

    #[test]
    fn test_set_title() {
        let mut session = ChatSession::new(UserId::new("user-1"));
        session.set_title("Trip planning");
        assert_eq!(session.title.as_deref(), Some("Trip planning"));
    }
}
