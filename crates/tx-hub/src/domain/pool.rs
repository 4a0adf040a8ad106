//! # Pool State - Receipts and Validity Buckets
//!
//! ## Data Structures
//!
//! - `all_transactions`: O(1) lookup of every receipt by id
//! - `valid`: flat set, every member is immediately executable
//! - `invalid` / `future` / `expired`: ids grouped by reference height
//!   (`BTreeMap`), so eviction by threshold only touches evicted heights
//!
//! ## Partition
//!
//! Every receipt in `all_transactions` sits in exactly one bucket, the one
//! named by its `ref_block_status`. Bucket membership is only ever changed
//! by `PoolState` methods, which keep the two sides in step.

use super::entities::{BlockHeight, RefBlockStatus, Transaction, TransactionId, TransactionReceipt};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

type HeightBuckets = BTreeMap<BlockHeight, HashSet<TransactionId>>;

/// Classification tables partitioning the pool by status.
#[derive(Debug, Default)]
pub struct PoolIndex {
    valid: HashSet<TransactionId>,
    invalid: HeightBuckets,
    future: HeightBuckets,
    expired: HeightBuckets,
}

impl PoolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a receipt into the bucket matching its status.
    ///
    /// Returns false for an unclassified receipt, which has no bucket.
    pub fn file(&mut self, receipt: &TransactionReceipt) -> bool {
        let id = receipt.transaction_id;
        let height = receipt.ref_block_number();
        match receipt.ref_block_status {
            RefBlockStatus::Unknown => return false,
            RefBlockStatus::Valid => {
                self.valid.insert(id);
            }
            RefBlockStatus::Invalid => {
                self.invalid.entry(height).or_default().insert(id);
            }
            RefBlockStatus::FutureRefBlock => {
                self.future.entry(height).or_default().insert(id);
            }
            RefBlockStatus::Expired => {
                self.expired.entry(height).or_default().insert(id);
            }
        }
        true
    }

    /// Removes a receipt from the bucket its status points at.
    pub fn unfile(&mut self, receipt: &TransactionReceipt) -> bool {
        let id = &receipt.transaction_id;
        let height = receipt.ref_block_number();
        match receipt.ref_block_status {
            RefBlockStatus::Unknown => false,
            RefBlockStatus::Valid => self.valid.remove(id),
            RefBlockStatus::Invalid => Self::remove_from(&mut self.invalid, height, id),
            RefBlockStatus::FutureRefBlock => Self::remove_from(&mut self.future, height, id),
            RefBlockStatus::Expired => Self::remove_from(&mut self.expired, height, id),
        }
    }

    fn remove_from(buckets: &mut HeightBuckets, height: BlockHeight, id: &TransactionId) -> bool {
        let Some(bucket) = buckets.get_mut(&height) else {
            return false;
        };
        let removed = bucket.remove(id);
        if bucket.is_empty() {
            buckets.remove(&height);
        }
        removed
    }

    /// Clears every bucket.
    pub fn reset(&mut self) {
        self.valid.clear();
        self.invalid.clear();
        self.future.clear();
        self.expired.clear();
    }

    /// Removes and returns the ids of every expired receipt whose
    /// reference height is at or below `height`.
    pub fn evict_expired_at_or_below(&mut self, height: BlockHeight) -> Vec<TransactionId> {
        // split_off keeps keys >= height + 1 on the right-hand side
        let keep = match height.checked_add(1) {
            Some(above) => self.expired.split_off(&above),
            None => BTreeMap::new(),
        };
        let evicted = std::mem::replace(&mut self.expired, keep);
        evicted.into_values().flatten().collect()
    }

    /// Ids in the valid bucket, in bucket-iteration order.
    pub fn valid_ids(&self) -> impl Iterator<Item = &TransactionId> {
        self.valid.iter()
    }

    /// Status of the bucket holding `id`, if any.
    pub fn bucket_of(&self, id: &TransactionId, height: BlockHeight) -> Option<RefBlockStatus> {
        let in_bucket = |buckets: &HeightBuckets| {
            buckets
                .get(&height)
                .is_some_and(|bucket| bucket.contains(id))
        };
        if self.valid.contains(id) {
            Some(RefBlockStatus::Valid)
        } else if in_bucket(&self.invalid) {
            Some(RefBlockStatus::Invalid)
        } else if in_bucket(&self.future) {
            Some(RefBlockStatus::FutureRefBlock)
        } else if in_bucket(&self.expired) {
            Some(RefBlockStatus::Expired)
        } else {
            None
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    pub fn invalid_count(&self) -> usize {
        Self::count(&self.invalid)
    }

    pub fn future_count(&self) -> usize {
        Self::count(&self.future)
    }

    pub fn expired_count(&self) -> usize {
        Self::count(&self.expired)
    }

    /// Total filed ids across all buckets.
    pub fn len(&self) -> usize {
        self.valid_count() + self.invalid_count() + self.future_count() + self.expired_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn count(buckets: &HeightBuckets) -> usize {
        buckets.values().map(HashSet::len).sum()
    }
}

/// Counts of receipts whose status changed during a reclassification pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReclassifySummary {
    /// Receipts visited.
    pub total: usize,
    /// Receipts whose status differs from before the pass.
    pub changed: usize,
}

/// The pool aggregate: every receipt plus the index over them.
#[derive(Debug, Default)]
pub struct PoolState {
    all_transactions: HashMap<TransactionId, TransactionReceipt>,
    index: PoolIndex,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of receipts in the pool.
    pub fn len(&self) -> usize {
        self.all_transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_transactions.is_empty()
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        self.all_transactions.contains_key(id)
    }

    pub fn get(&self, id: &TransactionId) -> Option<&TransactionReceipt> {
        self.all_transactions.get(id)
    }

    pub fn index(&self) -> &PoolIndex {
        &self.index
    }

    /// Adds a classified receipt.
    ///
    /// Returns false, leaving the pool untouched, if the id is already
    /// present or the receipt has not been classified.
    pub fn insert(&mut self, receipt: TransactionReceipt) -> bool {
        if receipt.ref_block_status == RefBlockStatus::Unknown
            || self.all_transactions.contains_key(&receipt.transaction_id)
        {
            return false;
        }
        self.index.file(&receipt);
        self.all_transactions.insert(receipt.transaction_id, receipt);
        true
    }

    /// Removes a receipt and its bucket entry.
    pub fn remove(&mut self, id: &TransactionId) -> Option<TransactionReceipt> {
        let receipt = self.all_transactions.remove(id)?;
        self.index.unfile(&receipt);
        Some(receipt)
    }

    /// Distinct reference heights across the pool.
    pub fn distinct_ref_heights(&self) -> BTreeSet<BlockHeight> {
        self.all_transactions
            .values()
            .map(TransactionReceipt::ref_block_number)
            .collect()
    }

    /// Rebuilds the index from scratch, assigning every receipt the status
    /// returned by `classify_fn`.
    pub fn reclassify_all<F>(&mut self, mut classify_fn: F) -> ReclassifySummary
    where
        F: FnMut(&TransactionReceipt) -> RefBlockStatus,
    {
        self.index.reset();
        let mut summary = ReclassifySummary::default();
        for receipt in self.all_transactions.values_mut() {
            let status = classify_fn(receipt);
            if status != receipt.ref_block_status {
                summary.changed += 1;
            }
            receipt.ref_block_status = status;
            self.index.file(receipt);
            summary.total += 1;
        }
        summary
    }

    /// Permanently removes expired receipts whose reference height is at or
    /// below `height`.
    pub fn evict_expired_at_or_below(&mut self, height: BlockHeight) -> Vec<TransactionReceipt> {
        self.index
            .evict_expired_at_or_below(height)
            .into_iter()
            .filter_map(|id| self.all_transactions.remove(&id))
            .collect()
    }

    /// Valid transactions in bucket-iteration order, at most `limit`.
    pub fn valid_transactions(&self, limit: Option<usize>) -> Vec<Transaction> {
        self.index
            .valid_ids()
            .filter_map(|id| self.all_transactions.get(id))
            .take(limit.unwrap_or(usize::MAX))
            .map(|receipt| receipt.transaction.clone())
            .collect()
    }

    /// Checks that every receipt is filed in exactly the bucket its status
    /// names and that no bucket holds anything else.
    pub fn check_partition(&self) -> bool {
        let all_filed = self.all_transactions.values().all(|receipt| {
            self.index
                .bucket_of(&receipt.transaction_id, receipt.ref_block_number())
                == Some(receipt.ref_block_status)
        });
        all_filed && self.index.len() == self.all_transactions.len()
    }
}
