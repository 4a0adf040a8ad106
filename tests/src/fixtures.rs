//! # Test Fixtures
//!
//! A `TestNode` wires the real bus, event loop and hub to in-memory
//! collaborators, the way a node host would.

use hub_telemetry::{init_logging, TelemetryConfig};
use rand::Rng;
use shared_bus::{ChainEvent, EventPublisher, InMemoryEventBus};
use shared_types::{BlockHeight, ChainHead, Hash, RefBlockPrefix, Transaction};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tx_hub::{
    EventBusAcceptedPublisher, InMemoryChainView, InMemoryTransactionStore, TxHub, TxHubConfig,
    TxHubEventLoop,
};

/// Hub wired to the bus.
pub type BusHub = TxHub<InMemoryChainView, InMemoryTransactionStore, EventBusAcceptedPublisher>;

/// How long a test waits for the event loop to catch up.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

static LOGGING: Once = Once::new();

/// Install quiet logging once per test binary.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        // A subscriber installed by another harness is fine.
        let _ = init_logging(&TelemetryConfig::for_tests());
    });
}

/// Transaction with a deterministic id derived from `seed`.
pub fn create_tx(seed: u64, ref_block_number: BlockHeight, prefix: RefBlockPrefix) -> Transaction {
    Transaction {
        from: [0xAA; 20],
        to: [0xBB; 20],
        method_name: "Transfer".to_string(),
        params: seed.to_le_bytes().to_vec(),
        ref_block_number,
        ref_block_prefix: prefix,
        signature: [0u8; 64],
    }
}

/// Transaction with random sender and payload.
pub fn random_tx<R: Rng>(rng: &mut R, ref_block_number: BlockHeight, prefix: RefBlockPrefix) -> Transaction {
    let mut signature = [0u8; 64];
    rng.fill(&mut signature[..]);
    Transaction {
        from: rng.gen(),
        to: rng.gen(),
        method_name: "Transfer".to_string(),
        params: (0..rng.gen_range(0..32)).map(|_| rng.gen()).collect(),
        ref_block_number,
        ref_block_prefix: prefix,
        signature,
    }
}

/// Bus, event loop, hub and collaborators for one chain.
pub struct TestNode {
    pub config: TxHubConfig,
    pub bus: Arc<InMemoryEventBus>,
    pub view: Arc<InMemoryChainView>,
    pub store: Arc<InMemoryTransactionStore>,
    pub hub: Arc<BusHub>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TestNode {
    /// Starts a node. The event loop is subscribed before this returns.
    pub fn start(config: TxHubConfig) -> Self {
        init_test_logging();
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
        let view = Arc::new(InMemoryChainView::new(config.chain_id));
        let store = Arc::new(InMemoryTransactionStore::new());
        let hub = Arc::new(
            TxHub::new(
                config.clone(),
                Arc::clone(&view),
                Arc::clone(&store),
                Arc::new(EventBusAcceptedPublisher::new(Arc::clone(&bus))),
            )
            .expect("test config is valid"),
        );
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = TxHubEventLoop::new(Arc::clone(&hub), &bus, shutdown_rx).spawn();
        Self {
            config,
            bus,
            view,
            store,
            hub,
            shutdown,
            handle,
        }
    }

    pub fn chain_id(&self) -> i32 {
        self.config.chain_id
    }

    pub async fn publish(&self, event: ChainEvent) {
        self.bus.publish(event).await;
    }

    pub async fn submit(&self, transactions: Vec<Transaction>) {
        self.publish(ChainEvent::TransactionsReceived {
            chain_id: self.chain_id(),
            transactions,
        })
        .await;
    }

    /// Builds blocks on `parent`, makes the tip the view's best head,
    /// announces it and waits until the hub has adopted it.
    pub async fn extend_best_chain(&self, parent: Hash, count: usize, salt: u64) -> Vec<Hash> {
        let hashes = self.view.append_chain(parent, count, salt);
        if let Some(&tip) = hashes.last() {
            let head = self
                .view
                .set_best_head(tip)
                .expect("block was just appended");
            self.announce_head(head).await;
            self.wait_for_head(head).await;
        }
        hashes
    }

    pub async fn announce_head(&self, head: ChainHead) {
        self.publish(ChainEvent::BestChainFound {
            chain_id: self.chain_id(),
            block_hash: head.hash,
            block_height: head.height,
        })
        .await;
    }

    pub async fn announce_irreversible(&self, block_hash: Hash, block_height: BlockHeight) {
        self.publish(ChainEvent::NewIrreversibleBlockFound {
            chain_id: self.chain_id(),
            block_hash,
            block_height,
        })
        .await;
    }

    /// Waits until the hub's cached head is `head`.
    pub async fn wait_for_head(&self, head: ChainHead) {
        let hub = Arc::clone(&self.hub);
        wait_until(move || hub.best_chain() == head).await;
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = tokio::time::timeout(SETTLE_TIMEOUT, self.handle).await;
    }
}

/// Polls `condition` until it holds. Panics after [`SETTLE_TIMEOUT`].
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let polled = tokio::time::timeout(SETTLE_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not reached within {:?}", SETTLE_TIMEOUT);
}
