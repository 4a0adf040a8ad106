//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{ChainEvent, EventFilter};
use crate::subscriber::{EventStream, QueuedSender, QueuedSubscription, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    async fn publish(&self, event: ChainEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Every subscriber sees every event in publication order.
///
/// Broadcast subscribers share one ring of `capacity` events and lose the
/// oldest ones when they fall behind. Queued subscribers each get their own
/// bounded `mpsc` queue of matching events and apply backpressure instead.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<ChainEvent>,

    /// Queued subscribers.
    queued: Mutex<Vec<QueuedSender>>,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    ///
    /// A zero capacity is raised to one; `broadcast::channel` rejects zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            queued: Mutex::new(Vec::new()),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Only events published after this call are delivered.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        debug!(topics = ?filter.topics, chains = ?filter.chain_ids, "New subscription created");
        Subscription::new(receiver, filter)
    }

    /// Subscribe with a dedicated queue holding up to `capacity` matching
    /// events.
    ///
    /// Publishing a matching event waits while the queue is full. Only
    /// events published after this call are delivered.
    #[must_use]
    pub fn subscribe_queued(&self, filter: EventFilter, capacity: usize) -> QueuedSubscription {
        let (subscription, handle) = QueuedSubscription::new(filter, capacity);
        debug!(
            subscription = %handle.id,
            topics = ?handle.filter.topics,
            chains = ?handle.filter.chain_ids,
            capacity,
            "New queued subscription created"
        );
        self.queued.lock().push(handle);
        subscription
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Get the number of active subscribers, broadcast and queued.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let queued = self
            .queued
            .lock()
            .iter()
            .filter(|q| !q.sender.is_closed())
            .count();
        self.sender.receiver_count() + queued
    }

    /// Delivers to every matching queued subscriber, waiting for queue space.
    /// Returns how many took the event.
    async fn deliver_queued(&self, event: &ChainEvent) -> usize {
        let targets: Vec<QueuedSender> = self
            .queued
            .lock()
            .iter()
            .filter(|q| q.filter.matches(event))
            .cloned()
            .collect();

        let mut delivered = 0;
        let mut closed = false;
        for target in targets {
            if target.sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            } else {
                debug!(subscription = %target.id, "Queued subscriber gone, removing");
                closed = true;
            }
        }
        if closed {
            self.queued.lock().retain(|q| !q.sender.is_closed());
        }
        delivered
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ChainEvent) -> usize {
        let topic = event.topic();
        let chain_id = event.chain_id();
        let name = event.name();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let queued = self.deliver_queued(&event).await;
        let broadcast = self.sender.send(event).unwrap_or(0);
        let receivers = broadcast + queued;

        if receivers == 0 {
            warn!(
                event = name,
                topic = ?topic,
                chain_id,
                "Event dropped (no receivers)"
            );
        } else {
            debug!(
                event = name,
                topic = ?topic,
                chain_id,
                receivers,
                "Event published"
            );
        }
        receivers
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
