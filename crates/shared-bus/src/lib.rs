//! # Shared Bus - Chain Event Bus
//!
//! In-process publish/subscribe for chain-lifecycle events. The block tree,
//! finality and network services publish here; the transaction hub consumes
//! their events and publishes `TransactionAccepted` back.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Blockchain  │                    │  Tx Hub      │
//! │  service     │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Every subscriber receives events in publication order. A subscriber that
//! falls more than the channel capacity behind loses the oldest events.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ChainEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{
    EventStream, EventSubscriber, QueuedSubscription, Subscription, SubscriptionError,
};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
