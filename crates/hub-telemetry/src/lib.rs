//! # Hub Telemetry
//!
//! Logging setup for processes embedding the transaction hub.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hub_telemetry::{init_logging, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//!
//!     // Hub logs now go to stdout
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TXHUB_SERVICE_NAME` | `tx-hub` | Service name in logs |
//! | `TXHUB_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honored) |
//! | `TXHUB_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `TXHUB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}
