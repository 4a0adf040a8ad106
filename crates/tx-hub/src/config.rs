//! Transaction hub configuration.

use shared_types::ChainId;
use std::env;
use thiserror::Error;

/// Default chain id served by a hub.
pub const DEFAULT_CHAIN_ID: ChainId = 9_992_731;

/// Blocks after its reference block during which a transaction may be
/// included.
pub const DEFAULT_EXPIRY_WINDOW: u64 = 512;

/// Default bus capacity for hosts that build a bus from this config.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expiry window must be at least one block")]
    ZeroExpiryWindow,

    #[error("event channel capacity must be non-zero")]
    ZeroEventCapacity,
}

/// Configuration fixed at hub construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHubConfig {
    /// Chain this hub serves. Events for other chains are ignored.
    pub chain_id: ChainId,
    /// Expiry window in blocks.
    pub expiry_window: u64,
    /// Capacity of the event bus feeding the hub.
    pub event_channel_capacity: usize,
}

impl Default for TxHubConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl TxHubConfig {
    /// Small window so tests can walk a transaction to expiry quickly.
    pub fn for_testing() -> Self {
        Self {
            chain_id: 1,
            expiry_window: 5,
            event_channel_capacity: 64,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TXHUB_CHAIN_ID`: Chain id (default: 9992731)
    /// - `TXHUB_EXPIRY_WINDOW`: Expiry window in blocks (default: 512)
    /// - `TXHUB_EVENT_CAPACITY`: Event bus capacity (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chain_id: env::var("TXHUB_CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chain_id),

            expiry_window: env::var("TXHUB_EXPIRY_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.expiry_window),

            event_channel_capacity: env::var("TXHUB_EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_channel_capacity),
        }
    }

    pub fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_expiry_window(mut self, expiry_window: u64) -> Self {
        self.expiry_window = expiry_window;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// - `ZeroExpiryWindow`: every transaction would be expired on arrival
    /// - `ZeroEventCapacity`: the bus cannot buffer a single event
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiry_window == 0 {
            return Err(ConfigError::ZeroExpiryWindow);
        }
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }
}
