//! # Shared Types Crate
//!
//! Chain primitives exchanged between the transaction hub, the event bus
//! and the node services the hub talks to.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transaction, block and head types are
//!   defined once here.
//! - **Content-derived identity**: a transaction id is a hash of its content,
//!   so the same transaction received twice has the same id.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
