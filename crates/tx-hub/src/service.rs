//! Transaction hub service.
//!
//! Owns the pool and the cached best-chain head, drives the classifier on
//! every chain-lifecycle event and answers block-production queries.
//!
//! ## Locking
//!
//! - `mutation_gate` (async mutex) is held for the whole of every mutating
//!   handler, so submit, block-accepted, best-chain and irreversible
//!   handlers never interleave.
//! - `state` (`parking_lot::RwLock`) is only taken in short synchronous
//!   sections. Collaborator calls run without it, and readers always see
//!   the pool either before or after a mutation.

use crate::config::{ConfigError, TxHubConfig};
use crate::domain::{
    classify, PoolState, PoolStatus, RefBlockStatus, TransactionReceipt, TxHubError, TxHubResult,
};
use crate::metrics;
use crate::ports::{ChainViewAccessor, TransactionAcceptedPublisher, TransactionStore, TxHubApi};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{
    short_hex, BlockHeight, ChainHead, ChainId, ExecutableTransactionSet, Hash, RefBlockPrefix,
    Transaction, TransactionId,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Pool plus the head it was last classified against.
#[derive(Debug, Default)]
struct HubState {
    pool: PoolState,
    best_chain: ChainHead,
}

/// Transaction hub implementation.
pub struct TxHub<C, S, P>
where
    C: ChainViewAccessor,
    S: TransactionStore,
    P: TransactionAcceptedPublisher,
{
    config: TxHubConfig,
    state: Arc<RwLock<HubState>>,
    mutation_gate: Mutex<()>,
    chain_view: Arc<C>,
    store: Arc<S>,
    publisher: Arc<P>,
}

impl<C, S, P> TxHub<C, S, P>
where
    C: ChainViewAccessor,
    S: TransactionStore,
    P: TransactionAcceptedPublisher,
{
    /// Creates an empty hub whose cached head is [`ChainHead::initial`].
    ///
    /// # Errors
    /// Any [`ConfigError`] from [`TxHubConfig::validate`]. The expiry window
    /// cannot change after construction.
    pub fn new(
        config: TxHubConfig,
        chain_view: Arc<C>,
        store: Arc<S>,
        publisher: Arc<P>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: Arc::new(RwLock::new(HubState::default())),
            mutation_gate: Mutex::new(()),
            chain_view,
            store,
            publisher,
        })
    }

    pub fn config(&self) -> &TxHubConfig {
        &self.config
    }

    /// Cached best-chain head.
    pub fn best_chain(&self) -> ChainHead {
        self.state.read().best_chain
    }

    /// Whether every pooled receipt sits in exactly its status bucket.
    pub fn check_partition(&self) -> bool {
        self.state.read().pool.check_partition()
    }

    fn is_foreign(&self, chain_id: ChainId, event: &'static str) -> bool {
        if chain_id == self.config.chain_id {
            return false;
        }
        trace!(
            event,
            chain_id,
            own_chain_id = self.config.chain_id,
            "Ignoring event for another chain"
        );
        true
    }

    fn is_pooled(&self, transaction_id: &TransactionId) -> bool {
        self.state.read().pool.contains(transaction_id)
    }

    fn classify_receipt(
        &self,
        receipt: &TransactionReceipt,
        prefixes: &HashMap<BlockHeight, Option<RefBlockPrefix>>,
        best_chain_height: BlockHeight,
    ) -> RefBlockStatus {
        let height = receipt.ref_block_number();
        classify(
            height,
            receipt.ref_block_prefix(),
            prefixes.get(&height).copied().flatten(),
            best_chain_height,
            self.config.expiry_window,
        )
    }

    /// Files classified receipts and returns the transactions that entered
    /// as `Valid`.
    fn file_receipts(&self, receipts: Vec<TransactionReceipt>) -> Vec<Transaction> {
        let mut state = self.state.write();
        let mut accepted = Vec::new();
        for receipt in receipts {
            let tx_id = short_hex(&receipt.transaction_id);
            let status = receipt.ref_block_status;
            let valid_tx = receipt.is_valid().then(|| receipt.transaction.clone());
            if !state.pool.insert(receipt) {
                continue;
            }
            debug!(tx_id = %tx_id, status = status.as_str(), "Transaction filed");
            accepted.extend(valid_tx);
        }
        debug_assert!(state.pool.check_partition());
        metrics::set_pool_sizes(state.pool.index());
        accepted
    }

    async fn announce(&self, accepted: Vec<Transaction>) {
        metrics::record_accepted(accepted.len());
        for transaction in accepted {
            let tx_id = short_hex(&transaction.hash());
            if let Err(e) = self
                .publisher
                .publish_accepted(self.config.chain_id, transaction)
                .await
            {
                warn!(tx_id = %tx_id, error = %e, "Failed to publish TransactionAccepted");
            }
        }
    }

    async fn executable_set(&self, limit: Option<usize>) -> ExecutableTransactionSet {
        let chain_id = self.config.chain_id;
        let cached = self.best_chain();

        let current = match self.chain_view.current_head(chain_id).await {
            Ok(head) => head,
            Err(e) => {
                warn!(chain_id, error = %e, "Chain head lookup failed, no executable set");
                metrics::record_stale_executable_request();
                return ExecutableTransactionSet::empty(chain_id, cached);
            }
        };

        let state = self.state.read();
        if state.best_chain != current {
            warn!(
                chain_id,
                cached_height = state.best_chain.height,
                cached_hash = %short_hex(&state.best_chain.hash),
                current_height = current.height,
                current_hash = %short_hex(&current.hash),
                "Cached head is stale, no executable set"
            );
            metrics::record_stale_executable_request();
            return ExecutableTransactionSet::empty(chain_id, state.best_chain);
        }

        ExecutableTransactionSet {
            chain_id,
            previous_block_hash: state.best_chain.hash,
            previous_block_height: state.best_chain.height,
            transactions: state.pool.valid_transactions(limit),
        }
    }
}

#[async_trait]
impl<C, S, P> TxHubApi for TxHub<C, S, P>
where
    C: ChainViewAccessor,
    S: TransactionStore,
    P: TransactionAcceptedPublisher,
{
    async fn handle_transactions_received(
        &self,
        chain_id: ChainId,
        transactions: Vec<Transaction>,
    ) -> TxHubResult<()> {
        if self.is_foreign(chain_id, "TransactionsReceived") {
            return Ok(());
        }
        let _gate = self.mutation_gate.lock().await;

        // Phase 1: drop anything already seen.
        let received = transactions.len();
        let mut seen = HashSet::with_capacity(received);
        let mut fresh = Vec::with_capacity(received);
        for transaction in transactions {
            let receipt = TransactionReceipt::new(transaction);
            let id = receipt.transaction_id;
            if !seen.insert(id) || self.is_pooled(&id) || self.store.exists(&id).await? {
                trace!(tx_id = %short_hex(&id), "Skipping known transaction");
                continue;
            }
            fresh.push(receipt);
        }
        if fresh.is_empty() {
            debug!(received, "No new transactions");
            return Ok(());
        }

        // Phase 2: classify against the cached head.
        let head = self.best_chain();
        let heights: BTreeSet<BlockHeight> =
            fresh.iter().map(TransactionReceipt::ref_block_number).collect();
        let prefixes = self
            .chain_view
            .prefixes_at_heights(chain_id, &heights, head.hash)
            .await?;
        for receipt in &mut fresh {
            receipt.ref_block_status = self.classify_receipt(receipt, &prefixes, head.height);
        }

        // Phase 3: persist, then file whatever made it to the store.
        let mut persisted = Vec::with_capacity(fresh.len());
        let mut failure = None;
        for receipt in fresh {
            if let Err(e) = self.store.persist(&receipt.transaction).await {
                failure = Some(e);
                break;
            }
            persisted.push(receipt);
        }
        let filed = persisted.len();
        let accepted = self.file_receipts(persisted);
        info!(
            received,
            filed,
            valid = accepted.len(),
            best_chain_height = head.height,
            "Transactions received"
        );
        self.announce(accepted).await;

        match failure {
            Some(e) => {
                warn!(filed, error = %e, "Persisting transactions failed part way");
                Err(e.into())
            }
            None => Ok(()),
        }
    }

    async fn handle_block_accepted(&self, chain_id: ChainId, block_hash: Hash) -> TxHubResult<()> {
        if self.is_foreign(chain_id, "BlockAccepted") {
            return Ok(());
        }
        let _gate = self.mutation_gate.lock().await;

        let block = self
            .chain_view
            .block_by_hash(chain_id, block_hash)
            .await?
            .ok_or_else(|| TxHubError::BlockNotFound {
                block_hash: hex::encode(block_hash),
            })?;

        let removed = {
            let mut state = self.state.write();
            let removed = block
                .transaction_ids()
                .iter()
                .filter(|id| state.pool.remove(id).is_some())
                .count();
            debug_assert!(state.pool.check_partition());
            metrics::set_pool_sizes(state.pool.index());
            removed
        };
        metrics::record_committed(removed);
        debug!(
            block_hash = %short_hex(&block_hash),
            height = block.height(),
            committed = block.transaction_ids().len(),
            removed,
            "Block accepted"
        );
        Ok(())
    }

    async fn handle_best_chain_found(
        &self,
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    ) -> TxHubResult<()> {
        if self.is_foreign(chain_id, "BestChainFound") {
            return Ok(());
        }
        let _gate = self.mutation_gate.lock().await;

        let heights = self.state.read().pool.distinct_ref_heights();
        let prefixes = match self
            .chain_view
            .prefixes_at_heights(chain_id, &heights, block_hash)
            .await
        {
            Ok(prefixes) => prefixes,
            Err(e) => {
                warn!(
                    block_hash = %short_hex(&block_hash),
                    height = block_height,
                    error = %e,
                    "Prefix lookup failed, keeping previous classification"
                );
                return Ok(());
            }
        };

        let mut state = self.state.write();
        let summary = state
            .pool
            .reclassify_all(|receipt| self.classify_receipt(receipt, &prefixes, block_height));
        state.best_chain = ChainHead::new(block_hash, block_height);
        debug_assert!(state.pool.check_partition());
        metrics::set_pool_sizes(state.pool.index());
        metrics::record_reclassification();

        let index = state.pool.index();
        info!(
            block_hash = %short_hex(&block_hash),
            height = block_height,
            total = summary.total,
            changed = summary.changed,
            valid = index.valid_count(),
            invalid = index.invalid_count(),
            future = index.future_count(),
            expired = index.expired_count(),
            "Best chain changed, pool reclassified"
        );
        Ok(())
    }

    async fn handle_new_irreversible_block_found(
        &self,
        chain_id: ChainId,
        block_hash: Hash,
        block_height: BlockHeight,
    ) -> TxHubResult<()> {
        if self.is_foreign(chain_id, "NewIrreversibleBlockFound") {
            return Ok(());
        }
        let _gate = self.mutation_gate.lock().await;

        let (evicted, remaining) = {
            let mut state = self.state.write();
            let evicted = state.pool.evict_expired_at_or_below(block_height).len();
            debug_assert!(state.pool.check_partition());
            metrics::set_pool_sizes(state.pool.index());
            (evicted, state.pool.len())
        };
        metrics::record_pruned(evicted);

        if evicted > 0 {
            info!(
                block_hash = %short_hex(&block_hash),
                height = block_height,
                evicted,
                remaining,
                "Pruned expired transactions"
            );
        }
        Ok(())
    }

    async fn get_executable_transaction_set(&self) -> ExecutableTransactionSet {
        self.executable_set(None).await
    }

    async fn get_executable_transaction_set_limited(&self, max: usize) -> ExecutableTransactionSet {
        self.executable_set(Some(max)).await
    }

    fn get_transaction_receipt(&self, transaction_id: &TransactionId) -> Option<TransactionReceipt> {
        self.state.read().pool.get(transaction_id).cloned()
    }

    fn get_all_transaction_count(&self) -> usize {
        self.state.read().pool.len()
    }

    fn get_validated_transaction_count(&self) -> usize {
        self.state.read().pool.index().valid_count()
    }

    fn get_status(&self) -> PoolStatus {
        let state = self.state.read();
        let index = state.pool.index();
        PoolStatus {
            chain_id: self.config.chain_id,
            best_chain_hash: state.best_chain.hash,
            best_chain_height: state.best_chain.height,
            all_transactions: state.pool.len(),
            valid: index.valid_count(),
            invalid: index.invalid_count(),
            future: index.future_count(),
            expired: index.expired_count(),
        }
    }

    fn chain_id(&self) -> ChainId {
        self.config.chain_id
    }
}
