//! Streaming latency metrics for a single exchange.

use std::sync::Mutex;
use std::time::Instant;

/// Immutable latency snapshot for one streaming exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingMetrics {
    /// When the exchange started.
    pub start: Instant,
    /// When the first token arrived, set at most once.
    pub first_token_at: Option<Instant>,
    /// When the most recent token arrived.
    pub last_token_at: Option<Instant>,
    /// Number of tokens recorded.
    pub token_count: u64,
    /// Time to first token in milliseconds, frozen once set.
    pub ttft_ms: Option<u64>,
}

impl StreamingMetrics {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            first_token_at: None,
            last_token_at: None,
            token_count: 0,
            ttft_ms: None,
        }
    }
}

/// Tracks token timing for one exchange.
///
/// Every transition replaces the whole snapshot, so readers never observe
/// a half-applied update. A single writer per exchange is assumed; the
/// tracker does not arbitrate concurrent writers.
#[derive(Debug)]
pub struct MetricsTracker {
    current: Mutex<StreamingMetrics>,
}

impl MetricsTracker {
    /// Create a tracker with the exchange clock started now.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(StreamingMetrics::new()),
        }
    }

    /// Record the first generated token.
    ///
    /// Idempotent: once the first-token time is set, later calls leave it
    /// and `ttft_ms` untouched.
    pub fn record_first_token(&self) {
        let now = Instant::now();
        let mut current = self.current.lock().unwrap();
        if current.first_token_at.is_some() {
            return;
        }
        let mut snapshot = *current;
        snapshot.first_token_at = Some(now);
        snapshot.ttft_ms = Some(now.duration_since(snapshot.start).as_millis() as u64);
        *current = snapshot;
    }

    /// Record one generated token.
    ///
    /// Performs the first-token transition when none has happened yet,
    /// then counts the token and advances the last-token time.
    pub fn record_token(&self) {
        let now = Instant::now();
        let mut current = self.current.lock().unwrap();
        let mut snapshot = *current;
        if snapshot.first_token_at.is_none() {
            snapshot.first_token_at = Some(now);
            snapshot.ttft_ms = Some(now.duration_since(snapshot.start).as_millis() as u64);
        }
        snapshot.token_count += 1;
        snapshot.last_token_at = Some(now);
        *current = snapshot;
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> StreamingMetrics {
        *self.current.lock().unwrap()
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}
