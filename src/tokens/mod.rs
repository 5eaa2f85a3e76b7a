//! Pool-token ledger: cached balances and the on-chain reads that fill them

pub mod balances;
pub mod fetcher;

pub use balances::*;
pub use fetcher::*;
