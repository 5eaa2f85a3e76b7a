//! Read-side seams for balances and prices owned outside the registry

use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Cached pool-token ledger reads, in the token's base units (no decimal
/// scaling). `None` means "not known yet".
pub trait BalanceLookup {
    fn user_balance(&self, pool_token: Address, account: Address) -> Option<Decimal>;
    fn total_supply(&self, pool_token: Address) -> Option<Decimal>;
}

pub trait PriceOracle {
    fn price_of(&self, token: Address) -> Option<Decimal>;
}

impl PriceOracle for HashMap<Address, Decimal> {
    fn price_of(&self, token: Address) -> Option<Decimal> {
        self.get(&token).copied()
    }
}
