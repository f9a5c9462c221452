//! Chat message types for conversation history.

use crate::ids::{MessageId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// User message (input/prompt).
    User,
    /// Assistant message (response).
    Assistant,
    /// System message (instructions).
    System,
}

/// Generation metadata attached to assistant messages.
///
/// Populated once the usage event for the exchange has arrived; messages
/// persisted before that carry no metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Model that generated the response.
    pub model: String,
    /// Prompt tokens consumed.
    pub tokens_in: u32,
    /// Completion tokens generated.
    pub tokens_out: u32,
    /// Cost of the exchange in USD.
    pub cost_usd: f64,
    /// Time to first token, milliseconds.
    pub ttft_ms: Option<u64>,
    /// Total exchange duration, milliseconds.
    pub duration_ms: Option<u64>,
}

/// A message in the conversation history.
///
/// Messages are immutable once created and are deleted only by a bulk
/// clear of local data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier, generated at creation.
    pub id: MessageId,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// Role of this message.
    pub role: ChatRole,
    /// Message content.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Present only for assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// Create a new chat message.
    pub fn new(session_id: SessionId, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            session_id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Create a user message.
    pub fn user(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, ChatRole::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, ChatRole::Assistant, content)
    }

    /// Create a system message.
    pub fn system(session_id: SessionId, content: impl Into<String>) -> Self {
        Self::new(session_id, ChatRole::System, content)
    }

    /// Builder method to attach generation metadata.
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let session_id = SessionId::generate();
        let msg = ChatMessage::user(session_id.clone(), "hello");

        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(msg.session_id, session_id);
        assert_eq!(msg.content, "hello");
        assert!(msg.metadata.is_none());
    }

    #[test]
    fn test_assistant_message_round_trip() {
        let metadata = MessageMetadata {
            model: "sonnet-4".to_string(),
            tokens_in: 120,
            tokens_out: 450,
            cost_usd: 0.0123,
            ttft_ms: Some(340),
            duration_ms: Some(4100),
        };
        let msg = ChatMessage::assistant(SessionId::generate(), "Here you go.")
            .with_metadata(metadata);

        let json = serde_json::to_string(&msg).unwrap();
        let restored: ChatMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, msg);
        let restored_meta = restored.metadata.unwrap();
        assert_eq!(restored_meta.model, "sonnet-4");
        assert_eq!(restored_meta.tokens_in, 120);
        assert_eq!(restored_meta.tokens_out, 450);
        assert_eq!(restored_meta.ttft_ms, Some(340));
    }

    #[test]
    fn test_metadata_absent_from_user_message_json() {
        let msg = ChatMessage::user(SessionId::generate(), "hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            r#""assistant""#
        );
        assert_eq!(serde_json::to_string(&ChatRole::User).unwrap(), r#""user""#);
    }
}
