//! # Chain Events
//!
//! The closed set of chain-lifecycle events that flow through the bus.
//! Inbound to the transaction hub: `TransactionsReceived`, `BlockAccepted`,
//! `BestChainFound`, `NewIrreversibleBlockFound`. Outbound from it:
//! `TransactionAccepted`.

use serde::{Deserialize, Serialize};
use shared_types::entities::{BlockHeader, BlockHeight, ChainId, Hash, Transaction};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEvent {
    // =========================================================================
    // NETWORK
    // =========================================================================
    /// Transactions arrived from a peer or a local submission API.
    TransactionsReceived {
        chain_id: ChainId,
        transactions: Vec<Transaction>,
    },

    // =========================================================================
    // BLOCKCHAIN SERVICE
    // =========================================================================
    /// A block was attached to the block tree.
    /// Its body lists the transactions it commits.
    BlockAccepted {
        chain_id: ChainId,
        block_header: BlockHeader,
    },

    /// The best chain moved to a new head (extension or reorganization).
    BestChainFound {
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    },

    // =========================================================================
    // FINALITY
    // =========================================================================
    /// A new last-irreversible block was found.
    NewIrreversibleBlockFound {
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    },

    // =========================================================================
    // TRANSACTION POOL
    // =========================================================================
    /// A newly submitted transaction was first classified as valid.
    TransactionAccepted {
        chain_id: ChainId,
        transaction: Transaction,
    },
}

impl ChainEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionsReceived { .. } => EventTopic::Network,
            Self::BlockAccepted { .. } | Self::BestChainFound { .. } => EventTopic::Blockchain,
            Self::NewIrreversibleBlockFound { .. } => EventTopic::Finality,
            Self::TransactionAccepted { .. } => EventTopic::TransactionPool,
        }
    }

    /// Chain the event belongs to.
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        match self {
            Self::TransactionsReceived { chain_id, .. }
            | Self::BlockAccepted { chain_id, .. }
            | Self::BestChainFound { chain_id, .. }
            | Self::NewIrreversibleBlockFound { chain_id, .. }
            | Self::TransactionAccepted { chain_id, .. } => *chain_id,
        }
    }

    /// Short name used in log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionsReceived { .. } => "TransactionsReceived",
            Self::BlockAccepted { .. } => "BlockAccepted",
            Self::BestChainFound { .. } => "BestChainFound",
            Self::NewIrreversibleBlockFound { .. } => "NewIrreversibleBlockFound",
            Self::TransactionAccepted { .. } => "TransactionAccepted",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Transactions received from the network.
    Network,
    /// Block tree and best-chain changes.
    Blockchain,
    /// Irreversibility notifications.
    Finality,
    /// Transaction pool output.
    TransactionPool,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Chains to include. Empty means all chains.
    pub chain_ids: Vec<ChainId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            chain_ids: Vec::new(),
        }
    }

    /// Restrict the filter to one chain.
    #[must_use]
    pub fn for_chain(mut self, chain_id: ChainId) -> Self {
        self.chain_ids = vec![chain_id];
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let chain_match = self.chain_ids.is_empty() || self.chain_ids.contains(&event.chain_id());

        topic_match && chain_match
    }
}
