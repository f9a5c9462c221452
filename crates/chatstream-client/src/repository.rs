//! Chat repository: the boundary between domain logic and the transport
//! and storage collaborators.

use std::sync::Arc;

use chatstream_core::{
    ChatMessage, ChatSession, MetricsTracker, SessionId, SseChatEvent, UserId, CODE_TRANSPORT,
    CODE_TRANSPORT_CLOSED, CODE_USAGE_DECODE,
};
use chatstream_diagnostics::{LogCollector, LogLevel};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::decoder::decode_frame;
use crate::store::{MessageStore, StoreError};
use crate::stream::ExchangeStream;
use crate::transport::{ChatTransport, FrameSource};

const LOG_TAG: &str = "ChatRepository";

/// Request to start one streaming exchange.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    /// The user's message for this turn.
    pub message: String,
    /// Session to continue, absent for a new conversation.
    pub session_id: Option<SessionId>,
    /// Whether the backend should use long-term memory.
    pub use_memory: bool,
}

impl ExchangeRequest {
    /// Create a request for a new conversation turn.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            use_memory: false,
        }
    }

    /// Continue an existing session.
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Enable backend long-term memory for this exchange.
    pub fn with_memory(mut self, use_memory: bool) -> Self {
        self.use_memory = use_memory;
        self
    }
}

/// Repository for chat exchanges and locally persisted history.
///
/// Owns a decoder invocation path and a [`MetricsTracker`] per exchange;
/// persistence and transport are pluggable collaborators.
pub struct ChatRepository {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn MessageStore>,
    diagnostics: Arc<LogCollector>,
}

impl ChatRepository {
    /// Create a repository over the given collaborators.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn MessageStore>,
        diagnostics: Arc<LogCollector>,
    ) -> Self {
        Self {
            transport,
            store,
            diagnostics,
        }
    }

    /// Start a streaming exchange and return its event sequence.
    ///
    /// The sequence is single-consumer and finite: it ends with `Done`, a
    /// terminal `Error`, or an implicit transport-closed `Error`.
    /// Transport failures surface as events on the sequence rather than as
    /// return values, so callers observe one failure channel. Dropping the
    /// stream closes the connection and halts decoding.
    pub fn begin_exchange(&self, request: ExchangeRequest) -> ExchangeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(MetricsTracker::new());
        let cancel = CancellationToken::new();

        info!(
            message_len = request.message.len(),
            session_id = ?request.session_id,
            use_memory = request.use_memory,
            "Beginning exchange"
        );

        let producer = ExchangeProducer {
            transport: Arc::clone(&self.transport),
            diagnostics: Arc::clone(&self.diagnostics),
            metrics: Arc::clone(&metrics),
            cancel: cancel.clone(),
            tx,
        };
        tokio::spawn(async move { producer.run(request).await });

        ExchangeStream::new(rx, metrics, cancel.drop_guard())
    }

    /// Store a completed message. Idempotent for an identical id.
    pub async fn persist_message(&self, message: &ChatMessage) -> Result<(), StoreError> {
        self.store.persist_message(message).await
    }

    /// Messages of a session in creation order.
    pub async fn list_session_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        self.store.list_session_messages(session_id).await
    }

    /// All sessions for the current user.
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, StoreError> {
        self.store.list_sessions().await
    }

    /// Allocate a new session with a fresh id.
    pub async fn create_session(&self, user_id: &UserId) -> Result<ChatSession, StoreError> {
        let session = self.store.create_session(user_id).await?;
        debug!(session_id = %session.id, "Created session");
        Ok(session)
    }

    /// Delete all locally owned sessions and messages. Irreversible.
    pub async fn clear_all_data(&self) -> Result<(), StoreError> {
        self.store.clear_all().await?;
        self.diagnostics
            .log(LogLevel::Info, LOG_TAG, "cleared all local chat data");
        Ok(())
    }
}

/// Background task pumping frames from the transport to the consumer.
struct ExchangeProducer {
    transport: Arc<dyn ChatTransport>,
    diagnostics: Arc<LogCollector>,
    metrics: Arc<MetricsTracker>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<SseChatEvent>,
}

impl ExchangeProducer {
    async fn run(self, request: ExchangeRequest) {
        let mut source = match self.transport.open(&request).await {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "Failed to open exchange transport");
                self.diagnostics
                    .log(LogLevel::Error, LOG_TAG, format!("connect failed: {e}"));
                self.emit(SseChatEvent::Error {
                    message: e.to_string(),
                    code: Some(CODE_TRANSPORT.to_string()),
                });
                return;
            }
        };

        debug!("Exchange stream opened");
        let mut frame_count = 0u64;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!(frames = frame_count, "Exchange abandoned by consumer, closing transport");
                    self.diagnostics
                        .log(LogLevel::Info, LOG_TAG, "exchange cancelled by consumer");
                    source.close().await;
                    return;
                }
                frame = source.next_frame() => match frame {
                    Ok(Some(frame)) => {
                        frame_count += 1;
                        trace!(
                            frame_num = frame_count,
                            event_type = ?frame.event_type,
                            "Received frame"
                        );

                        let event = decode_frame(frame.event_type.as_deref(), &frame.data);
                        if let SseChatEvent::Token { .. } = event {
                            self.metrics.record_token();
                        }
                        self.log_event(&event);

                        let terminal = is_stream_terminal(&event);
                        if !self.emit(event) {
                            // Consumer gone, nothing left to deliver.
                            source.close().await;
                            return;
                        }
                        if terminal {
                            info!(frames = frame_count, "Exchange finished");
                            source.close().await;
                            return;
                        }
                    }
                    Ok(None) => {
                        info!(frames = frame_count, "Transport closed without terminal event");
                        self.diagnostics
                            .log(LogLevel::Warn, LOG_TAG, "stream closed before done");
                        self.emit(SseChatEvent::Error {
                            message: "stream closed before completion".to_string(),
                            code: Some(CODE_TRANSPORT_CLOSED.to_string()),
                        });
                        source.close().await;
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, frames = frame_count, "Frame read failed");
                        self.diagnostics
                            .log(LogLevel::Error, LOG_TAG, format!("read failed: {e}"));
                        self.emit(SseChatEvent::Error {
                            message: e.to_string(),
                            code: Some(CODE_TRANSPORT.to_string()),
                        });
                        source.close().await;
                        return;
                    }
                }
            }
        }
    }

    // Returns false once the consumer has dropped the stream.
    fn emit(&self, event: SseChatEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    fn log_event(&self, event: &SseChatEvent) {
        match event {
            // Tokens are too chatty for the bounded diagnostic buffer.
            SseChatEvent::Token { .. } => {}
            SseChatEvent::Usage {
                tokens_in,
                tokens_out,
                ..
            } => {
                self.diagnostics.log(
                    LogLevel::Info,
                    LOG_TAG,
                    format!("usage: {tokens_in} in / {tokens_out} out"),
                );
            }
            SseChatEvent::Done { finish_reason } => {
                self.diagnostics
                    .log(LogLevel::Info, LOG_TAG, format!("done: {finish_reason}"));
            }
            SseChatEvent::Error { message, code } => {
                self.diagnostics.log(
                    LogLevel::Error,
                    LOG_TAG,
                    format!("error ({}): {message}", code.as_deref().unwrap_or("-")),
                );
            }
            SseChatEvent::Heartbeat => {
                self.diagnostics.log(LogLevel::Debug, LOG_TAG, "heartbeat");
            }
            SseChatEvent::Unknown { event_type, .. } => {
                self.diagnostics.log(
                    LogLevel::Info,
                    LOG_TAG,
                    format!("unknown event type: {event_type}"),
                );
            }
        }
    }
}

// Done always ends the stream; errors end it unless they are the decoder's
// non-fatal usage-decode diagnostic.
fn is_stream_terminal(event: &SseChatEvent) -> bool {
    match event {
        SseChatEvent::Done { .. } => true,
        SseChatEvent::Error { code, .. } => code.as_deref() != Some(CODE_USAGE_DECODE),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_request_builder() {
        let session_id = SessionId::generate();
        let request = ExchangeRequest::new("hello")
            .with_session(session_id.clone())
            .with_memory(true);

        assert_eq!(request.message, "hello");
        assert_eq!(request.session_id, Some(session_id));
        assert!(request.use_memory);
    }

    #[test]
    fn test_usage_decode_error_is_not_terminal() {
        let event = SseChatEvent::Error {
            message: "bad usage".to_string(),
            code: Some(CODE_USAGE_DECODE.to_string()),
        };
        assert!(!is_stream_terminal(&event));

        let event = SseChatEvent::Error {
            message: "backend failure".to_string(),
            code: Some("500".to_string()),
        };
        assert!(is_stream_terminal(&event));

        let event = SseChatEvent::Done {
            finish_reason: "stop".to_string(),
        };
        assert!(is_stream_terminal(&event));
    }
}
