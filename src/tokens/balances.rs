//! Balance cache implementing the calculator's lookup seam

use alloy::primitives::Address;
use dashmap::DashMap;
use rust_decimal::Decimal;
use crate::shares::BalanceLookup;

/// Last known pool-token balances and supplies, in base units.
#[derive(Default)]
pub struct BalanceBook {
    balances: DashMap<(Address, Address), Decimal>,
    supplies: DashMap<Address, Decimal>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, token: Address, account: Address, balance: Decimal) {
        self.balances.insert((token, account), balance);
    }

    pub fn set_total_supply(&self, token: Address, supply: Decimal) {
        self.supplies.insert(token, supply);
    }

    /// Drop everything held for `account`, e.g. on wallet disconnect.
    pub fn forget_account(&self, account: Address) {
        self.balances.retain(|(_, holder), _| *holder != account);
    }
}

impl BalanceLookup for BalanceBook {
    fn user_balance(&self, pool_token: Address, account: Address) -> Option<Decimal> {
        self.balances.get(&(pool_token, account)).map(|b| *b)
    }

    fn total_supply(&self, pool_token: Address) -> Option<Decimal> {
        self.supplies.get(&pool_token).map(|s| *s)
    }
}
