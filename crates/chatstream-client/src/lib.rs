//! Chatstream streaming client
//!
//! This crate converts the incrementally delivered event stream from the
//! chat backend into typed events, tracks per-exchange latency, and
//! persists completed messages through a pluggable store.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatstream_client::{ChatRepository, ChatTransport, ExchangeRequest, MemoryStore};
//! use chatstream_diagnostics::LogCollector;
//!
//! async fn run(transport: Arc<dyn ChatTransport>) {
//!     let repository = ChatRepository::new(
//!         transport,
//!         Arc::new(MemoryStore::new()),
//!         LogCollector::new(),
//!     );
//!
//!     let mut stream = repository.begin_exchange(ExchangeRequest::new("What is 2 + 2?"));
//!     while let Some(event) = stream.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

mod decoder;
mod repository;
mod store;
mod stream;
mod transport;

// Re-export main types
pub use decoder::decode_frame;
pub use repository::{ChatRepository, ExchangeRequest};
pub use store::{MemoryStore, MessageStore, StoreError};
pub use stream::ExchangeStream;
pub use transport::{ChatTransport, Frame, FrameSource, TransportError};
