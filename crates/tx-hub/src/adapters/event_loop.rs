//! Event loop driving the hub from the shared bus.
//!
//! A single consumer drains one queued subscription and awaits each handler
//! before taking the next event, so handlers run one at a time in arrival
//! order.
//!
//! The queue holds only the hub's inbound topics for its own chain. The
//! `TransactionAccepted` events the hub publishes never take a slot, and
//! when the queue is full publishers wait rather than overwrite queued
//! lifecycle events.

use crate::ports::TxHubApi;
use shared_bus::{ChainEvent, EventFilter, EventTopic, InMemoryEventBus, QueuedSubscription};
use shared_types::short_hex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

/// Topics the hub consumes. `TransactionPool` is its own output.
pub const INBOUND_TOPICS: [EventTopic; 3] =
    [EventTopic::Network, EventTopic::Blockchain, EventTopic::Finality];

/// Single consumer feeding bus events to a [`TxHubApi`].
pub struct TxHubEventLoop<H: TxHubApi> {
    hub: Arc<H>,
    subscription: QueuedSubscription,
    shutdown: watch::Receiver<bool>,
}

impl<H: TxHubApi + 'static> TxHubEventLoop<H> {
    /// Subscribes to the hub's inbound topics on its own chain, with a queue
    /// as deep as the bus ring.
    ///
    /// Only events published after this call are seen.
    pub fn new(hub: Arc<H>, bus: &InMemoryEventBus, shutdown: watch::Receiver<bool>) -> Self {
        Self::with_queue_capacity(hub, bus, shutdown, bus.capacity())
    }

    /// Like [`new`](Self::new) with an explicit queue depth.
    pub fn with_queue_capacity(
        hub: Arc<H>,
        bus: &InMemoryEventBus,
        shutdown: watch::Receiver<bool>,
        capacity: usize,
    ) -> Self {
        let filter = EventFilter::topics(INBOUND_TOPICS.to_vec()).for_chain(hub.chain_id());
        Self {
            subscription: bus.subscribe_queued(filter, capacity),
            hub,
            shutdown,
        }
    }

    /// Runs the loop on a tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Processes events until the bus closes or shutdown is signalled.
    pub async fn run(mut self) {
        info!(chain_id = self.hub.chain_id(), "[tx-hub] Event loop started");
        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("[tx-hub] Shutdown signalled, exiting");
                        break;
                    }
                }
                event = self.subscription.recv() => {
                    let Some(event) = event else {
                        info!("[tx-hub] Channel closed, exiting");
                        break;
                    };
                    self.dispatch(event).await;
                }
            }
        }
    }

    /// Routes one event to its handler. Handler errors are logged; the
    /// loop keeps going.
    pub async fn dispatch(&self, event: ChainEvent) {
        let name = event.name();
        let result = match event {
            ChainEvent::TransactionsReceived {
                chain_id,
                transactions,
            } => {
                self.hub
                    .handle_transactions_received(chain_id, transactions)
                    .await
            }
            ChainEvent::BlockAccepted {
                chain_id,
                block_header,
            } => {
                self.hub
                    .handle_block_accepted(chain_id, block_header.hash())
                    .await
            }
            ChainEvent::BestChainFound {
                chain_id,
                block_hash,
                block_height,
            } => {
                info!(
                    "[tx-hub] Best chain -> #{} {}",
                    block_height,
                    short_hex(&block_hash)
                );
                self.hub
                    .handle_best_chain_found(chain_id, block_hash, block_height)
                    .await
            }
            ChainEvent::NewIrreversibleBlockFound {
                chain_id,
                block_hash,
                block_height,
            } => {
                self.hub
                    .handle_new_irreversible_block_found(chain_id, block_hash, block_height)
                    .await
            }
            ChainEvent::TransactionAccepted { .. } => {
                trace!("[tx-hub] Ignoring own TransactionAccepted");
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(event = name, error = %e, "[tx-hub] Handler failed");
        }
    }
}
