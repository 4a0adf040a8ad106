//! Core domain entities for the transaction hub.
//!
//! A receipt wraps one pending transaction together with the validity
//! status last derived for its reference block.

// Re-export from shared-types for convenience
pub use shared_types::{
    BlockHeight, ChainHead, ChainId, Hash, RefBlockPrefix, Transaction, TransactionId,
};

use serde::{Deserialize, Serialize};

/// Validity of a transaction's reference block against the best chain.
///
/// ```text
///            ┌──────────── best chain catches up ────────────┐
///            │                                               ▼
/// [Unknown] ─┼─→ [FutureRefBlock] ──→ [Valid] ⇄ [Invalid]   (reorg)
///            │                          │          │
///            └──────────────────────────┴──────────┴──→ [Expired]
/// ```
///
/// Every status except `Unknown` is recomputed from scratch on each
/// best-chain change. `Expired` is terminal in practice: heights only move
/// forward once the window has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RefBlockStatus {
    /// Created but not yet classified. Never filed into the index.
    #[default]
    Unknown,
    /// Reference block is canonical and its prefix matches.
    Valid,
    /// A canonical block exists at the reference height with another prefix.
    Invalid,
    /// The best chain has not reached the reference height yet.
    FutureRefBlock,
    /// The reference height has fallen out of the expiry window.
    Expired,
}

impl RefBlockStatus {
    /// Label used in log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::FutureRefBlock => "future",
            Self::Expired => "expired",
        }
    }
}

/// A transaction held by the pool.
///
/// One receipt exists per unique transaction id for as long as the
/// transaction stays in the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Content-derived id of `transaction`.
    pub transaction_id: TransactionId,
    /// The transaction as received.
    pub transaction: Transaction,
    /// Status from the latest classification.
    pub ref_block_status: RefBlockStatus,
}

impl TransactionReceipt {
    /// Creates an unclassified receipt.
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.hash(),
            transaction,
            ref_block_status: RefBlockStatus::Unknown,
        }
    }

    /// Height of the block this transaction references.
    pub fn ref_block_number(&self) -> BlockHeight {
        self.transaction.ref_block_number
    }

    /// Prefix of the block this transaction references.
    pub fn ref_block_prefix(&self) -> RefBlockPrefix {
        self.transaction.ref_block_prefix
    }

    pub fn is_valid(&self) -> bool {
        self.ref_block_status == RefBlockStatus::Valid
    }
}

/// Point-in-time pool statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Chain the pool serves.
    pub chain_id: ChainId,
    /// Cached best-chain head.
    pub best_chain_hash: Hash,
    pub best_chain_height: BlockHeight,
    /// Receipts in the pool.
    pub all_transactions: usize,
    pub valid: usize,
    pub invalid: usize,
    pub future: usize,
    pub expired: usize,
}
