//! Chatstream Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/transport
//! - Storage backends
//! - Runtime specifics
//!
//! All types here represent the core business domain of the chat client.

pub mod event;
pub mod ids;
pub mod message;
pub mod metrics;
pub mod session;

// Re-export commonly used types
pub use event::{SseChatEvent, CODE_TRANSPORT, CODE_TRANSPORT_CLOSED, CODE_USAGE_DECODE};
pub use ids::{MessageId, SessionId, UserId};
pub use message::{ChatMessage, ChatRole, MessageMetadata};
pub use metrics::{MetricsTracker, StreamingMetrics};
pub use session::ChatSession;
