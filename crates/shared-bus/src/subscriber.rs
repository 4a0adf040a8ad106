//! # Event Subscriber
//!
//! Defines the subscription side of the event bus.

use crate::events::{ChainEvent, EventFilter};
use crate::publisher::InMemoryEventBus;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for subscribing to events from the bus.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

/// A subscription handle for receiving events.
pub struct Subscription {
    /// Identifier used in log fields.
    id: Uuid,

    /// The broadcast receiver.
    receiver: broadcast::Receiver<ChainEvent>,

    /// Filter for this subscription.
    filter: EventFilter,
}

impl Subscription {
    /// Create a new subscription.
    pub(crate) fn new(receiver: broadcast::Receiver<ChainEvent>, filter: EventFilter) -> Self {
        Self {
            id: Uuid::new_v4(),
            receiver,
            filter,
        }
    }

    /// Receive the next event that matches the filter.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next matching event
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(subscription = %self.id, lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - An event was available and matched
    /// - `Ok(None)` - No event available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<ChainEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Subscription identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(subscription = %self.id, "Subscription dropped");
    }
}

/// Bus-side handle of a [`QueuedSubscription`].
#[derive(Clone)]
pub(crate) struct QueuedSender {
    pub(crate) id: Uuid,
    pub(crate) filter: EventFilter,
    pub(crate) sender: mpsc::Sender<ChainEvent>,
}

/// A subscription with its own bounded queue.
///
/// Unlike [`Subscription`], the filter runs when the event is published, so
/// only matching events take queue slots, and a full queue makes the
/// publisher wait instead of overwriting older events. Nothing is lost
/// while the subscription is alive.
pub struct QueuedSubscription {
    id: Uuid,
    receiver: mpsc::Receiver<ChainEvent>,
    filter: EventFilter,
}

impl QueuedSubscription {
    pub(crate) fn new(filter: EventFilter, capacity: usize) -> (Self, QueuedSender) {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = QueuedSender {
            id,
            filter: filter.clone(),
            sender,
        };
        (
            Self {
                id,
                receiver,
                filter,
            },
            handle,
        )
    }

    /// Receive the next queued event.
    ///
    /// Returns `None` once the bus is dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        self.receiver.recv().await
    }

    /// Try to receive the next queued event without blocking.
    pub fn try_recv(&mut self) -> Result<Option<ChainEvent>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Subscription identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for QueuedSubscription {
    fn drop(&mut self) {
        debug!(subscription = %self.id, "Queued subscription dropped");
    }
}

/// A filtered stream of bus events.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
/// Lagged gaps are skipped.
pub struct EventStream {
    inner: BroadcastStream<ChainEvent>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<ChainEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = ChainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    warn!(lagged = count, "Event stream lagged, some events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
