//! Ports layer for the transaction hub.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API exposed to the rest of the node
//! - Outbound (Driven) ports: chain view, durable store, notifications

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
