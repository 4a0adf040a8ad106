//! Transaction hub error types.

use shared_types::{ChainError, StoreError};
use thiserror::Error;

/// Errors surfaced by the hub's handlers and queries.
///
/// Staleness, duplicate submissions and foreign-chain events are not
/// errors; they resolve to `Ok`.
#[derive(Debug, Error)]
pub enum TxHubError {
    /// Chain view lookup failed.
    #[error("Chain view error: {0}")]
    Chain(#[from] ChainError),

    /// Durable store failed.
    #[error("Transaction store error: {0}")]
    Store(#[from] StoreError),

    /// An accepted block could not be loaded.
    #[error("Accepted block not found: {block_hash}")]
    BlockNotFound { block_hash: String },
}

/// Result type for hub operations.
pub type TxHubResult<T> = Result<T, TxHubError>;
