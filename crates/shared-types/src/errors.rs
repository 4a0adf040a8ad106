//! # Error Types
//!
//! Errors reported by the collaborators the transaction hub consumes.

use crate::entities::ChainId;
use thiserror::Error;

/// Errors from the chain view (block index service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No chain record exists for this id.
    #[error("Chain not found: {0}")]
    ChainNotFound(ChainId),

    /// Block lookup by hash found nothing.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// The index service could not answer.
    #[error("Chain view unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the durable transaction store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Transaction store unavailable: {0}")]
    Unavailable(String),

    /// Stored bytes failed to decode.
    #[error("Corrupted transaction record: {0}")]
    Corrupted(String),
}
