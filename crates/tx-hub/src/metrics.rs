//! # Transaction Hub Metrics
//!
//! Prometheus metrics for pool size and churn.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! tx-hub = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `txhub_pool_transactions` - Gauge of pooled transactions, labeled by status
//! - `txhub_transactions_accepted_total` - Counter of transactions first classified valid
//! - `txhub_transactions_committed_total` - Counter of transactions removed by accepted blocks
//! - `txhub_transactions_pruned_total` - Counter of expired transactions evicted at finality
//! - `txhub_reclassifications_total` - Counter of best-chain reclassification passes
//! - `txhub_stale_executable_requests_total` - Counter of executable-set requests answered empty

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge_vec, IntCounter, IntGaugeVec};

use crate::domain::PoolIndex;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Pooled transactions per status bucket
    pub static ref POOL_TRANSACTIONS: IntGaugeVec = register_int_gauge_vec!(
        "txhub_pool_transactions",
        "Number of pooled transactions per reference-block status",
        &["status"]
    )
    .expect("Failed to create POOL_TRANSACTIONS metric");

    /// Transactions first classified valid
    pub static ref TRANSACTIONS_ACCEPTED: IntCounter = register_int_counter!(
        "txhub_transactions_accepted_total",
        "Total number of submitted transactions first classified valid"
    )
    .expect("Failed to create TRANSACTIONS_ACCEPTED metric");

    /// Transactions removed because a block committed them
    pub static ref TRANSACTIONS_COMMITTED: IntCounter = register_int_counter!(
        "txhub_transactions_committed_total",
        "Total number of transactions removed by accepted blocks"
    )
    .expect("Failed to create TRANSACTIONS_COMMITTED metric");

    /// Expired transactions evicted at finality
    pub static ref TRANSACTIONS_PRUNED: IntCounter = register_int_counter!(
        "txhub_transactions_pruned_total",
        "Total number of expired transactions evicted by irreversible blocks"
    )
    .expect("Failed to create TRANSACTIONS_PRUNED metric");

    /// Best-chain reclassification passes
    pub static ref RECLASSIFICATIONS: IntCounter = register_int_counter!(
        "txhub_reclassifications_total",
        "Total number of full-pool reclassification passes"
    )
    .expect("Failed to create RECLASSIFICATIONS metric");

    /// Executable-set requests answered with an empty set
    pub static ref STALE_EXECUTABLE_REQUESTS: IntCounter = register_int_counter!(
        "txhub_stale_executable_requests_total",
        "Executable-set requests answered empty because the cached head was stale"
    )
    .expect("Failed to create STALE_EXECUTABLE_REQUESTS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Update the per-bucket pool gauges
#[cfg(feature = "metrics")]
pub fn set_pool_sizes(index: &PoolIndex) {
    let sizes = [
        ("valid", index.valid_count()),
        ("invalid", index.invalid_count()),
        ("future", index.future_count()),
        ("expired", index.expired_count()),
    ];
    for (status, size) in sizes {
        POOL_TRANSACTIONS
            .with_label_values(&[status])
            .set(i64::try_from(size).unwrap_or(i64::MAX));
    }
}

/// Record transactions first classified valid
#[cfg(feature = "metrics")]
pub fn record_accepted(count: usize) {
    TRANSACTIONS_ACCEPTED.inc_by(count as u64);
}

/// Record transactions committed by a block
#[cfg(feature = "metrics")]
pub fn record_committed(count: usize) {
    TRANSACTIONS_COMMITTED.inc_by(count as u64);
}

/// Record expired transactions evicted
#[cfg(feature = "metrics")]
pub fn record_pruned(count: usize) {
    TRANSACTIONS_PRUNED.inc_by(count as u64);
}

/// Record a reclassification pass
#[cfg(feature = "metrics")]
pub fn record_reclassification() {
    RECLASSIFICATIONS.inc();
}

/// Record an executable-set request answered empty
#[cfg(feature = "metrics")]
pub fn record_stale_executable_request() {
    STALE_EXECUTABLE_REQUESTS.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn set_pool_sizes(_index: &PoolIndex) {}

#[cfg(not(feature = "metrics"))]
pub fn record_accepted(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_committed(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_pruned(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reclassification() {}

#[cfg(not(feature = "metrics"))]
pub fn record_stale_executable_request() {}
