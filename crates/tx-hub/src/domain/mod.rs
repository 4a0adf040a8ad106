//! # Domain Layer - Transaction Hub
//!
//! Pure pool logic with no I/O.
//!
//! ## Components
//!
//! - `entities`: RefBlockStatus, TransactionReceipt, PoolStatus
//! - `classifier`: reference-block validity rules
//! - `pool`: PoolIndex buckets and the PoolState aggregate
//! - `errors`: TxHubError enumeration

pub mod classifier;
pub mod entities;
pub mod errors;
pub mod pool;

pub use classifier::*;
pub use entities::*;
pub use errors::*;
pub use pool::*;
