//! Adapters layer for the transaction hub.
//!
//! Provides event bus integration and in-memory collaborators.

pub mod event_loop;
pub mod memory;
pub mod publisher;

pub use event_loop::{TxHubEventLoop, INBOUND_TOPICS};
pub use memory::{InMemoryChainView, InMemoryTransactionStore};
pub use publisher::{EventBusAcceptedPublisher, NoOpPublisher, RecordingPublisher};
