//! In-app diagnostic log collection.
//!
//! A bounded, process-scoped buffer of structured log lines that any
//! component can append to. The collector republishes a fully formatted
//! snapshot after every write, so debug surfaces subscribe to one latest
//! value instead of tailing a file.
//!
//! Construct one collector at startup and hand an `Arc` to every component
//! that logs; there is no ambient global instance.

mod collector;

pub use collector::{LogCollector, LogEntry, LogLevel, MAX_ENTRIES, MAX_EXPORT_CHARS};
