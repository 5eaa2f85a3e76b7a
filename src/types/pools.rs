//! Pool snapshot and registry record types

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Pool tokens are minted with 18 decimals.
pub const POOL_TOKEN_DECIMALS: u8 = 18;

/// One constituent token of a pool, as of the snapshot's block.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub balance: Decimal,
    pub denorm_weight: Decimal,
}

/// Full pool state as fetched from the query layer.
///
/// Snapshots are never mutated; a newer fetch replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    pub address: Address,
    /// Constituents in `tokens_list` order.
    pub tokens: Vec<PoolToken>,
    pub swap_fee: Decimal,
    pub finalized: bool,
    pub tokens_list: Vec<Address>,
    /// Token whose total supply measures ownership of the pool.
    pub pool_token: Address,
    pub total_weight: Decimal,
}

impl PoolSnapshot {
    pub fn token(&self, token: Address) -> Option<&PoolToken> {
        self.tokens.iter().find(|t| t.address == token)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Short "SYM/SYM/SYM" label used in log output.
    pub fn label(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.symbol.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[derive(Debug, Clone)]
pub struct PoolRecord {
    pub block_last_fetched: u64,
    pub snapshot: Arc<PoolSnapshot>,
}

/// What a registry merge did with an incoming snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced { previous_block: u64 },
    Stale { stored_block: u64 },
}

impl MergeOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MergeOutcome::Stale { .. })
    }
}

/// Sent to registry subscribers whenever a stored snapshot changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    pub pool: Address,
    pub block: u64,
    pub outcome: MergeOutcome,
}
