//! Weighted pool dashboard core
//!
//! Keeps the freshest subgraph snapshot of every pool, reconciled by the block
//! it was fetched at, derives an account's share and liquidity value from
//! pool-token balances, and builds/submits `joinPool`/`exitPool` transactions.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod registry;
pub mod subgraph;
pub mod shares;
pub mod tokens;
pub mod transactions;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{PoolError, PoolResult};
pub use registry::{PoolRegistry, PoolSync};
pub use shares::ShareCalculator;
pub use types::*;

// Type alias for our concrete provider
pub type ConcreteProvider = alloy::providers::RootProvider<alloy::transports::BoxTransport>;
