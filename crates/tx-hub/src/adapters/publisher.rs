//! Event publisher adapters for the transaction hub.
//!
//! Publishes `TransactionAccepted` to the shared bus.

use crate::domain::TxHubResult;
use crate::ports::TransactionAcceptedPublisher;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{ChainEvent, EventPublisher, InMemoryEventBus};
use shared_types::{short_hex, ChainId, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Publishes acceptance notifications on the shared event bus.
pub struct EventBusAcceptedPublisher<B: EventPublisher = InMemoryEventBus> {
    bus: Arc<B>,
}

impl<B: EventPublisher> EventBusAcceptedPublisher<B> {
    pub fn new(bus: Arc<B>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl<B: EventPublisher> TransactionAcceptedPublisher for EventBusAcceptedPublisher<B> {
    async fn publish_accepted(&self, chain_id: ChainId, transaction: Transaction) -> TxHubResult<()> {
        let tx_id = short_hex(&transaction.hash());
        // No receivers is fine: nobody downstream is listening yet.
        let receivers = self
            .bus
            .publish(ChainEvent::TransactionAccepted {
                chain_id,
                transaction,
            })
            .await;
        debug!(chain_id, tx_id = %tx_id, receivers, "TransactionAccepted published");
        Ok(())
    }
}

/// No-op publisher for hosts without downstream consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPublisher;

#[async_trait]
impl TransactionAcceptedPublisher for NoOpPublisher {
    async fn publish_accepted(&self, _chain_id: ChainId, _transaction: Transaction) -> TxHubResult<()> {
        Ok(())
    }
}

/// Recording publisher for tests.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    accepted: Mutex<Vec<(ChainId, Transaction)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification received so far, in order.
    pub fn accepted(&self) -> Vec<(ChainId, Transaction)> {
        self.accepted.lock().clone()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.lock().len()
    }
}

#[async_trait]
impl TransactionAcceptedPublisher for RecordingPublisher {
    async fn publish_accepted(&self, chain_id: ChainId, transaction: Transaction) -> TxHubResult<()> {
        self.accepted.lock().push((chain_id, transaction));
        Ok(())
    }
}
