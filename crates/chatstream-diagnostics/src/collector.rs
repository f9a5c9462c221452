//! Bounded FIFO log buffer with a live formatted snapshot.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

/// Maximum number of buffered entries; oldest are evicted first.
pub const MAX_ENTRIES: usize = 100;

/// Character cap applied to the exported snapshot. The buffer itself is
/// bounded by entry count, not characters.
pub const MAX_EXPORT_CHARS: usize = 10_000;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One buffered log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Component that produced the entry.
    pub tag: String,
    /// Log message.
    pub message: String,
}

impl LogEntry {
    /// Render as `[HH:MM:SS.mmm] LEVEL/tag: message`.
    pub fn format(&self) -> String {
        format!(
            "[{}] {}/{}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.tag,
            self.message
        )
    }
}

/// Process-scoped collector of diagnostic log lines.
///
/// Appends from any number of producers are serialized; the formatted
/// snapshot is republished after every write while the buffer lock is
/// still held, so published snapshots appear in append order and readers
/// always see a fully formed string.
pub struct LogCollector {
    entries: Mutex<VecDeque<LogEntry>>,
    snapshot: watch::Sender<String>,
}

impl LogCollector {
    /// Create a collector ready to be shared across components.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append an entry, evicting the oldest when the buffer is full, then
    /// republish the formatted snapshot.
    pub fn log(&self, level: LogLevel, tag: impl Into<String>, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            tag: tag.into(),
            message: message.into(),
        };
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == MAX_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
        self.snapshot.send_replace(render(&entries));
    }

    /// Latest formatted snapshot, oldest entry first.
    pub fn formatted_logs(&self) -> String {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.snapshot.subscribe()
    }

    /// Drop all buffered entries and reset the published snapshot.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        self.snapshot.send_replace(String::new());
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogCollector {
    fn default() -> Self {
        let (snapshot, _) = watch::channel(String::new());
        Self {
            entries: Mutex::new(VecDeque::with_capacity(MAX_ENTRIES)),
            snapshot,
        }
    }
}

fn render(entries: &VecDeque<LogEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&entry.format());
    }
    truncate_front(out, MAX_EXPORT_CHARS)
}

// Keep the trailing `max_chars` characters, cutting on a char boundary.
fn truncate_front(text: String, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    text.chars().skip(count - max_chars).collect()
}
