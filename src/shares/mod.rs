//! Proportional share and liquidity value calculations

pub mod calculator;
pub mod lookups;

pub use calculator::*;
pub use lookups::*;
