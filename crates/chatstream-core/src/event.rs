//! Typed events decoded from the chat event stream.

use serde::{Deserialize, Serialize};

/// Code attached to errors produced by a malformed usage payload.
pub const CODE_USAGE_DECODE: &str = "usage_decode_failed";

/// Code for a connection that closed without a terminal event.
pub const CODE_TRANSPORT_CLOSED: &str = "transport_closed";

/// Code for a transport-level connect or read failure.
pub const CODE_TRANSPORT: &str = "transport_error";

/// One decoded event from the streaming chat backend.
///
/// Every frame maps to exactly one variant. Unrecognized frames land in
/// `Unknown` so newer backends degrade gracefully instead of breaking the
/// stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SseChatEvent {
    /// A chunk of generated text.
    Token { text: String },

    /// Token accounting for the exchange.
    Usage {
        tokens_in: u32,
        tokens_out: u32,
        cost_usd: f64,
        model: String,
    },

    /// The backend finished the exchange.
    Done { finish_reason: String },

    /// A backend or transport failure.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    /// Keep-alive frame, no domain payload.
    Heartbeat,

    /// Unrecognized frame, kept for diagnostics.
    Unknown { event_type: String, raw_data: String },
}

impl SseChatEvent {
    /// True for events that end the exchange stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Usage { .. } => "usage",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
            Self::Heartbeat => "heartbeat",
            Self::Unknown { .. } => "unknown",
        }
    }
}
