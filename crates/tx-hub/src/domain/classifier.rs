//! Reference-block validity classifier.
//!
//! Pure function of the transaction's declared reference block and the
//! canonical view at that height. Checks run in a fixed order:
//!
//! | Step | Condition | Status |
//! |------|-----------|--------|
//! | 1 | `ref + window <= best_height` | `Expired` |
//! | 2 | no canonical block at `ref` | `FutureRefBlock` |
//! | 3 | canonical prefix equals the transaction's | `Valid` |
//! | 4 | otherwise | `Invalid` |
//!
//! Prefixes are short fingerprints; a colliding prefix on a foreign fork
//! classifies as `Valid`. That risk sits with the sender.

use super::entities::{BlockHeight, RefBlockPrefix, RefBlockStatus};

/// Classifies one transaction.
///
/// `canonical_prefix` is `None` when the best chain has no block at
/// `ref_block_number`. That is distinct from `Some` with another prefix.
pub fn classify(
    ref_block_number: BlockHeight,
    tx_prefix: RefBlockPrefix,
    canonical_prefix: Option<RefBlockPrefix>,
    best_chain_height: BlockHeight,
    expiry_window: u64,
) -> RefBlockStatus {
    if ref_block_number.saturating_add(expiry_window) <= best_chain_height {
        return RefBlockStatus::Expired;
    }

    match canonical_prefix {
        None => RefBlockStatus::FutureRefBlock,
        Some(prefix) if prefix == tx_prefix => RefBlockStatus::Valid,
        Some(_) => RefBlockStatus::Invalid,
    }
}
