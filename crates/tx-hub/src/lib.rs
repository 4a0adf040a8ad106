//! # Transaction Hub
//!
//! Pending-transaction pool for one chain. Holds received transactions
//! until a block commits them or finality makes them garbage, and keeps
//! their eligibility correct as the best chain moves, reorganizations
//! included.
//!
//! ## Reference-Block Validity
//!
//! Every transaction names a recent block (`ref_block_number` plus the
//! first four bytes of its hash). The pool classifies each transaction
//! against the cached best chain:
//!
//! | Status | Condition |
//! |--------|-----------|
//! | `Expired` | `ref + expiry_window <= best_height` |
//! | `FutureRefBlock` | best chain has no block at `ref` yet |
//! | `Valid` | canonical prefix at `ref` matches |
//! | `Invalid` | canonical prefix at `ref` differs |
//!
//! Only `Valid` transactions are handed to block production.
//!
//! ## Lifecycle
//!
//! ```text
//! TransactionsReceived ──→ dedupe ──→ classify ──→ persist ──→ file
//!                                                               │
//! BestChainFound ──────────────→ reclassify whole pool ←────────┤
//! BlockAccepted ───────────────→ remove committed ids ←─────────┤
//! NewIrreversibleBlockFound ───→ evict Expired at/below height ←┘
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - bus publisher, event loop, in-memory collaborators │
//! │  service.rs - TxHub orchestration                               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - TxHubApi trait                             │
//! │  ports/outbound.rs - ChainViewAccessor, TransactionStore,       │
//! │                      TransactionAcceptedPublisher               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/entities.rs   - RefBlockStatus, TransactionReceipt     │
//! │  domain/classifier.rs - classify()                              │
//! │  domain/pool.rs       - PoolIndex, PoolState                    │
//! │  domain/errors.rs     - TxHubError enum                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use config::{ConfigError, TxHubConfig};
pub use domain::*;
pub use ports::*;
pub use service::TxHub;
