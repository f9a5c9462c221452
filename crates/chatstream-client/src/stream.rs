//! The per-exchange event stream handed to the consumer.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chatstream_core::{MetricsTracker, SseChatEvent, StreamingMetrics};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::DropGuard;

/// Lazily consumed sequence of events for one exchange.
///
/// Single-consumer and not restartable: the sequence ends with a `Done` or
/// terminal `Error` event, after which `recv` returns `None`. Dropping the
/// stream cancels the producer, which closes the underlying transport
/// connection; no frames are decoded for an abandoned exchange.
pub struct ExchangeStream {
    events: UnboundedReceiverStream<SseChatEvent>,
    metrics: Arc<MetricsTracker>,
    _cancel_on_drop: DropGuard,
}

impl ExchangeStream {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<SseChatEvent>,
        metrics: Arc<MetricsTracker>,
        cancel_on_drop: DropGuard,
    ) -> Self {
        Self {
            events: UnboundedReceiverStream::new(rx),
            metrics,
            _cancel_on_drop: cancel_on_drop,
        }
    }

    /// Receive the next event, or `None` once the exchange has ended.
    pub async fn recv(&mut self) -> Option<SseChatEvent> {
        self.events.next().await
    }

    /// Latency snapshot for this exchange so far.
    pub fn metrics(&self) -> StreamingMetrics {
        self.metrics.snapshot()
    }
}

impl Stream for ExchangeStream {
    type Item = SseChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}
