//! In-memory collaborators.
//!
//! Used by tests and by single-process hosts that have no block index or
//! transaction database of their own.

use crate::ports::{ChainViewAccessor, TransactionStore};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Block, BlockBody, BlockHeader, BlockHeight, ChainError, ChainHead, ChainId, Hash, StoreError,
    Transaction, TransactionId, GENESIS_BLOCK_HEIGHT,
};
use std::collections::HashMap;

// =============================================================================
// CHAIN VIEW
// =============================================================================

#[derive(Debug, Default)]
struct ChainViewInner {
    blocks: HashMap<Hash, Block>,
    best_head: ChainHead,
    unavailable: bool,
}

/// Fork-aware block tree with a settable best head.
///
/// Height lookups walk parent links back from the requested branch tip, so
/// the same height resolves differently on competing forks.
#[derive(Debug)]
pub struct InMemoryChainView {
    chain_id: ChainId,
    inner: RwLock<ChainViewInner>,
}

impl InMemoryChainView {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            inner: RwLock::new(ChainViewInner::default()),
        }
    }

    /// Adds a block on top of `parent` and returns it.
    ///
    /// The zero hash as parent starts a chain at genesis height. `salt`
    /// distinguishes sibling blocks on competing forks.
    pub fn append_block(
        &self,
        parent: Hash,
        transaction_ids: Vec<TransactionId>,
        salt: u64,
    ) -> Block {
        let mut inner = self.inner.write();
        let height = inner
            .blocks
            .get(&parent)
            .map_or(GENESIS_BLOCK_HEIGHT, |p| p.height() + 1);
        let block = Block {
            header: BlockHeader {
                chain_id: self.chain_id,
                height,
                previous_block_hash: parent,
                merkle_root: merkle_stub(&transaction_ids, salt),
                time: salt,
            },
            body: BlockBody { transaction_ids },
        };
        inner.blocks.insert(block.hash(), block.clone());
        block
    }

    /// Appends `count` empty blocks on top of `parent` and returns the hashes.
    pub fn append_chain(&self, parent: Hash, count: usize, salt: u64) -> Vec<Hash> {
        let mut hashes = Vec::with_capacity(count);
        let mut tip = parent;
        for _ in 0..count {
            tip = self.append_block(tip, Vec::new(), salt).hash();
            hashes.push(tip);
        }
        hashes
    }

    /// Makes a known block the best head. Returns the new head, or `None`
    /// for an unknown hash.
    pub fn set_best_head(&self, hash: Hash) -> Option<ChainHead> {
        let mut inner = self.inner.write();
        let height = inner.blocks.get(&hash)?.height();
        inner.best_head = ChainHead::new(hash, height);
        Some(inner.best_head)
    }

    /// Makes every lookup fail with `ChainError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().unavailable = unavailable;
    }

    pub fn best_head(&self) -> ChainHead {
        self.inner.read().best_head
    }

    fn check(&self, inner: &ChainViewInner, chain_id: ChainId) -> Result<(), ChainError> {
        if inner.unavailable {
            return Err(ChainError::Unavailable("chain view offline".to_string()));
        }
        if chain_id != self.chain_id {
            return Err(ChainError::ChainNotFound(chain_id));
        }
        Ok(())
    }
}

/// Deterministic stand-in root; block storage owns the real merkle tree.
fn merkle_stub(transaction_ids: &[TransactionId], salt: u64) -> Hash {
    let mut root = [0u8; 32];
    root[..8].copy_from_slice(&salt.to_le_bytes());
    for id in transaction_ids {
        for (byte, other) in root.iter_mut().zip(id) {
            *byte ^= other;
        }
    }
    root
}

#[async_trait]
impl ChainViewAccessor for InMemoryChainView {
    async fn current_head(&self, chain_id: ChainId) -> Result<ChainHead, ChainError> {
        let inner = self.inner.read();
        self.check(&inner, chain_id)?;
        Ok(inner.best_head)
    }

    async fn block_hash_at_height(
        &self,
        chain_id: ChainId,
        height: BlockHeight,
        relative_to: Hash,
    ) -> Result<Option<Hash>, ChainError> {
        let inner = self.inner.read();
        self.check(&inner, chain_id)?;

        let mut hash = relative_to;
        loop {
            let Some(block) = inner.blocks.get(&hash) else {
                return Ok(None);
            };
            if block.height() == height {
                return Ok(Some(hash));
            }
            if block.height() < height {
                return Ok(None);
            }
            hash = block.header.previous_block_hash;
        }
    }

    async fn block_by_hash(
        &self,
        chain_id: ChainId,
        hash: Hash,
    ) -> Result<Option<Block>, ChainError> {
        let inner = self.inner.read();
        self.check(&inner, chain_id)?;
        Ok(inner.blocks.get(&hash).cloned())
    }
}

// =============================================================================
// TRANSACTION STORE
// =============================================================================

#[derive(Debug, Default)]
struct StoreFaults {
    unavailable: bool,
    /// Persist calls left before persisting starts failing.
    persist_budget: Option<usize>,
}

/// `HashMap` transaction store with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    transactions: RwLock<HashMap<TransactionId, Transaction>>,
    faults: Mutex<StoreFaults>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `exists` and `persist` fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().unavailable = unavailable;
    }

    /// Lets `count` more persist calls succeed, then fails the rest.
    /// `None` removes the limit.
    pub fn fail_persist_after(&self, count: Option<usize>) {
        self.faults.lock().persist_budget = count;
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    pub fn contains(&self, transaction_id: &TransactionId) -> bool {
        self.transactions.read().contains_key(transaction_id)
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn exists(&self, transaction_id: &TransactionId) -> Result<bool, StoreError> {
        if self.faults.lock().unavailable {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(self.contains(transaction_id))
    }

    async fn persist(&self, transaction: &Transaction) -> Result<(), StoreError> {
        {
            let mut faults = self.faults.lock();
            if faults.unavailable {
                return Err(StoreError::Unavailable("store offline".to_string()));
            }
            if let Some(left) = faults.persist_budget.as_mut() {
                if *left == 0 {
                    return Err(StoreError::Unavailable("disk full".to_string()));
                }
                *left -= 1;
            }
        }
        self.transactions
            .write()
            .entry(transaction.hash())
            .or_insert_with(|| transaction.clone());
        Ok(())
    }
}
