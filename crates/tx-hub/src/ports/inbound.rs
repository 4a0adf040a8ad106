//! Inbound (Driving) port for the transaction hub.
//!
//! The four chain-lifecycle handlers are driven by the event loop; the
//! queries are called by block production and status APIs.

use crate::domain::{PoolStatus, TransactionReceipt, TxHubResult};
use async_trait::async_trait;
use shared_types::{BlockHeight, ChainId, ExecutableTransactionSet, Hash, Transaction, TransactionId};

/// Primary API of the transaction hub.
///
/// Handlers called with a foreign `chain_id` return `Ok(())` without
/// touching the pool. At most one handler mutates the pool at a time.
#[async_trait]
pub trait TxHubApi: Send + Sync {
    /// Submits received transactions.
    ///
    /// Transactions already pooled or already in the durable store are
    /// skipped. New ones are persisted, classified against the cached head
    /// and filed; each one first classified `Valid` is announced once.
    ///
    /// # Errors
    /// - `Chain`/`Store`: lookup failed before anything was persisted; the
    ///   pool is unchanged
    /// - `Store`: persisting failed part way; transactions persisted
    ///   before the failure are pooled
    async fn handle_transactions_received(
        &self,
        chain_id: ChainId,
        transactions: Vec<Transaction>,
    ) -> TxHubResult<()>;

    /// Removes every transaction committed by the accepted block,
    /// whatever its last status.
    ///
    /// # Errors
    /// - `Chain`: block lookup failed
    /// - `BlockNotFound`: the chain view has no block with this hash
    async fn handle_block_accepted(&self, chain_id: ChainId, block_hash: Hash) -> TxHubResult<()>;

    /// Re-derives the status of every pooled transaction against the new
    /// head, then caches the head.
    ///
    /// A failed prefix lookup leaves the pool and the cached head as they
    /// were; the executable set then reports "not ready".
    async fn handle_best_chain_found(
        &self,
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    ) -> TxHubResult<()>;

    /// Evicts expired transactions referencing heights at or below the
    /// new irreversible height.
    async fn handle_new_irreversible_block_found(
        &self,
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    ) -> TxHubResult<()>;

    /// Valid transactions on top of the cached head.
    ///
    /// Empty, paired with the cached head, when the cached head differs
    /// from the chain view's current head or the chain view is unreachable.
    async fn get_executable_transaction_set(&self) -> ExecutableTransactionSet;

    /// Like [`get_executable_transaction_set`](Self::get_executable_transaction_set)
    /// but returns at most `max` transactions.
    async fn get_executable_transaction_set_limited(&self, max: usize) -> ExecutableTransactionSet;

    /// Receipt for a pooled transaction.
    fn get_transaction_receipt(&self, transaction_id: &TransactionId) -> Option<TransactionReceipt>;

    /// Number of pooled transactions, any status.
    fn get_all_transaction_count(&self) -> usize;

    /// Number of pooled transactions currently `Valid`.
    fn get_validated_transaction_count(&self) -> usize;

    /// Pool statistics.
    fn get_status(&self) -> PoolStatus;

    /// Chain this hub serves.
    fn chain_id(&self) -> ChainId;
}
