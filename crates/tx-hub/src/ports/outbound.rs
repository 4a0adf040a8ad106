//! Outbound (Driven) ports for the transaction hub.
//!
//! These traits define dependencies on external systems that the hub
//! needs for operation.

use crate::domain::TxHubResult;
use async_trait::async_trait;
use shared_types::{
    ref_block_prefix, Block, BlockHeight, ChainError, ChainHead, ChainId, Hash, RefBlockPrefix,
    StoreError, Transaction, TransactionId,
};
use std::collections::{BTreeSet, HashMap};

/// Read-only view of the block index.
#[async_trait]
pub trait ChainViewAccessor: Send + Sync {
    /// The authoritative best-chain head.
    async fn current_head(&self, chain_id: ChainId) -> Result<ChainHead, ChainError>;

    /// Hash of the block at `height` on the branch ending at `relative_to`.
    ///
    /// # Returns
    /// - `Ok(Some(hash))`: a block exists at that height on the branch
    /// - `Ok(None)`: the branch is shorter than `height`
    /// - `Err`: lookup failed
    async fn block_hash_at_height(
        &self,
        chain_id: ChainId,
        height: BlockHeight,
        relative_to: Hash,
    ) -> Result<Option<Hash>, ChainError>;

    /// Loads a block by hash.
    async fn block_by_hash(&self, chain_id: ChainId, hash: Hash)
        -> Result<Option<Block>, ChainError>;

    /// Resolves the canonical prefix at every height in one batch.
    ///
    /// Every requested height appears in the result. The first failed
    /// lookup fails the whole batch.
    async fn prefixes_at_heights(
        &self,
        chain_id: ChainId,
        heights: &BTreeSet<BlockHeight>,
        relative_to: Hash,
    ) -> Result<HashMap<BlockHeight, Option<RefBlockPrefix>>, ChainError> {
        let mut prefixes = HashMap::with_capacity(heights.len());
        for &height in heights {
            let hash = self
                .block_hash_at_height(chain_id, height, relative_to)
                .await?;
            prefixes.insert(height, hash.as_ref().map(ref_block_prefix));
        }
        Ok(prefixes)
    }
}

/// Durable transaction storage.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Whether the transaction was persisted before.
    async fn exists(&self, transaction_id: &TransactionId) -> Result<bool, StoreError>;

    /// Persists a transaction. Persisting it again is a no-op.
    async fn persist(&self, transaction: &Transaction) -> Result<(), StoreError>;
}

/// Downstream notification of newly valid transactions.
#[async_trait]
pub trait TransactionAcceptedPublisher: Send + Sync {
    /// Announces a transaction whose first classification was `Valid`.
    async fn publish_accepted(&self, chain_id: ChainId, transaction: Transaction)
        -> TxHubResult<()>;
}
