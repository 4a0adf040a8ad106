//! # Integration Tests
//!
//! - `hub_flows`: the hub driven through the shared bus by its event loop
//! - `properties`: randomized operation sequences against the pool partition

#[cfg(test)]
mod hub_flows;
