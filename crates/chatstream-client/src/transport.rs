//! Transport contract for the chat event stream.
//!
//! The transport collaborator owns connection management, retries, and
//! timeouts; this crate only consumes ordered frames and closes the
//! connection when the exchange ends or is abandoned.

use async_trait::async_trait;
use thiserror::Error;

use crate::repository::ExchangeRequest;

/// One frame from the event-stream transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// SSE event label, absent for comment or unnamed frames.
    pub event_type: Option<String>,
    /// Raw payload text.
    pub data: String,
}

impl Frame {
    /// Create a frame with an event label.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            data: data.into(),
        }
    }

    /// Create a frame without an event label.
    pub fn unnamed(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
        }
    }
}

/// Errors surfaced by the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish the streaming connection.
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Failed to read the next frame.
    #[error("Failed to read frame: {0}")]
    Read(String),
}

/// Factory for streaming connections.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open a streaming connection for one exchange.
    async fn open(&self, request: &ExchangeRequest)
        -> Result<Box<dyn FrameSource>, TransportError>;
}

/// An open streaming connection delivering ordered frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the connection closed cleanly.
    async fn next_frame(&mut self) -> Result<Option<Frame>, TransportError>;

    /// Release the connection. Idempotent.
    async fn close(&mut self);
}
