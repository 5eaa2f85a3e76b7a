//! Share calculator over registry state and external balance lookups

use alloy::primitives::Address;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use crate::{
    errors::{PoolError, PoolResult},
    registry::PoolRegistry,
    shares::{BalanceLookup, PriceOracle},
    types::PoolSnapshot,
};

/// Stateless view combining the registry with a balance source.
///
/// Soft misses (account not connected, supply not loaded yet) come back as
/// `None`; a pool or token that does not exist is an error.
pub struct ShareCalculator<'a, B: BalanceLookup> {
    registry: &'a PoolRegistry,
    balances: &'a B,
}

impl<'a, B: BalanceLookup> ShareCalculator<'a, B> {
    pub fn new(registry: &'a PoolRegistry, balances: &'a B) -> Self {
        Self { registry, balances }
    }

    pub fn snapshot(&self, pool: Address) -> PoolResult<Arc<PoolSnapshot>> {
        self.registry.get(pool)
    }

    pub fn total_supply(&self, pool: Address) -> PoolResult<Option<Decimal>> {
        let snapshot = self.registry.get(pool)?;
        Ok(self.balances.total_supply(snapshot.pool_token))
    }

    /// `user balance / total supply`, or `None` if either is unknown or the
    /// supply is zero.
    pub fn share_proportion(&self, pool: Address, account: Option<Address>) -> Option<Decimal> {
        let account = account?;
        let snapshot = self.registry.get(pool).ok()?;
        let balance = self.balances.user_balance(snapshot.pool_token, account)?;
        let supply = self.balances.total_supply(snapshot.pool_token)?;
        if supply.is_zero() {
            return None;
        }
        balance.checked_div(supply)
    }

    pub fn liquidity_contribution(
        &self,
        pool: Address,
        token: Address,
        account: Option<Address>,
    ) -> PoolResult<Option<Decimal>> {
        let token = self.registry.get_token(pool, token)?;
        Ok(self
            .share_proportion(pool, account)
            .and_then(|share| token.balance.checked_mul(share)))
    }

    /// Sum of balance × price over every constituent; `None` if any price is
    /// missing.
    pub fn total_pool_value<O: PriceOracle>(&self, pool: Address, oracle: &O) -> PoolResult<Option<Decimal>> {
        let snapshot = self.registry.get(pool)?;
        let mut total = Decimal::ZERO;
        for token in &snapshot.tokens {
            let Some(price) = oracle.price_of(token.address) else {
                return Ok(None);
            };
            match token.balance.checked_mul(price).and_then(|v| total.checked_add(v)) {
                Some(sum) => total = sum,
                None => return Ok(None),
            }
        }
        Ok(Some(total))
    }

    pub fn user_liquidity_value<O: PriceOracle>(
        &self,
        pool: Address,
        account: Option<Address>,
        oracle: &O,
    ) -> PoolResult<Option<Decimal>> {
        let pool_value = self.total_pool_value(pool, oracle)?;
        Ok(self
            .share_proportion(pool, account)
            .zip(pool_value)
            .and_then(|(share, value)| share.checked_mul(value)))
    }

    /// Pool tokens a `ratio` of the supply represents, truncated so a removal
    /// never asks for more than the ratio entitles.
    pub fn pool_tokens_for_ratio(&self, pool: Address, ratio: Decimal) -> PoolResult<Option<Decimal>> {
        check_ratio(ratio)?;
        let Some(supply) = self.total_supply(pool)? else {
            return Ok(None);
        };
        Ok(ratio.checked_mul(supply).map(|amount| amount.floor()))
    }

    /// Per-token amounts matching `ratio` of the pool, in token order.
    pub fn token_amounts_for_ratio(&self, pool: Address, ratio: Decimal) -> PoolResult<Vec<Decimal>> {
        check_ratio(ratio)?;
        let snapshot = self.registry.get(pool)?;
        snapshot
            .tokens
            .iter()
            .map(|token| {
                token.balance.checked_mul(ratio).ok_or_else(|| PoolError::InvalidAmount {
                    amount: token.balance,
                    reason: format!("overflow scaling {} by {}", token.symbol, ratio),
                })
            })
            .collect()
    }

    /// Accept-any-amount bound for join/exit: one `"0"` per constituent.
    pub fn zeroed_output_vector(&self, pool: Address) -> PoolResult<Vec<String>> {
        let snapshot = self.registry.get(pool)?;
        Ok(vec!["0".to_string(); snapshot.token_count()])
    }
}

fn check_ratio(ratio: Decimal) -> PoolResult<()> {
    if ratio < dec!(0) || ratio > dec!(1) {
        return Err(PoolError::InvalidRatio { ratio });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::store::fixtures::{snapshot, token};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Ledger {
        balances: HashMap<(Address, Address), Decimal>,
        supplies: HashMap<Address, Decimal>,
    }

    impl BalanceLookup for Ledger {
        fn user_balance(&self, pool_token: Address, account: Address) -> Option<Decimal> {
            self.balances.get(&(pool_token, account)).copied()
        }

        fn total_supply(&self, pool_token: Address) -> Option<Decimal> {
            self.supplies.get(&pool_token).copied()
        }
    }

    fn pool() -> Address {
        Address::repeat_byte(0x50)
    }

    fn user() -> Address {
        Address::repeat_byte(0x0e)
    }

    fn token_a() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn token_b() -> Address {
        Address::repeat_byte(0x0b)
    }

    fn setup(supply: Option<Decimal>, user_balance: Option<Decimal>) -> (PoolRegistry, Ledger) {
        let registry = PoolRegistry::new();
        registry.merge(
            pool(),
            snapshot(
                pool(),
                vec![token(0x0a, "A", dec!(100)), token(0x0b, "B", dec!(200))],
                true,
            ),
            1,
        );
        let mut ledger = Ledger::default();
        if let Some(supply) = supply {
            ledger.supplies.insert(pool(), supply);
        }
        if let Some(balance) = user_balance {
            ledger.balances.insert((pool(), user()), balance);
        }
        (registry, ledger)
    }

    #[test]
    fn proportion_and_contributions() {
        let (registry, ledger) = setup(Some(dec!(1000)), Some(dec!(250)));
        let calc = ShareCalculator::new(&registry, &ledger);

        assert_eq!(calc.share_proportion(pool(), Some(user())), Some(dec!(0.25)));
        assert_eq!(calc.liquidity_contribution(pool(), token_a(), Some(user())).unwrap(), Some(dec!(25)));
        assert_eq!(calc.liquidity_contribution(pool(), token_b(), Some(user())).unwrap(), Some(dec!(50)));
    }

    #[test]
    fn proportion_soft_misses() {
        let (registry, ledger) = setup(Some(dec!(0)), Some(dec!(250)));
        let calc = ShareCalculator::new(&registry, &ledger);
        assert_eq!(calc.share_proportion(pool(), Some(user())), None);
        assert_eq!(calc.share_proportion(pool(), None), None);

        let (registry, ledger) = setup(None, Some(dec!(250)));
        let calc = ShareCalculator::new(&registry, &ledger);
        assert_eq!(calc.share_proportion(pool(), Some(user())), None);

        let (registry, ledger) = setup(Some(dec!(1000)), None);
        let calc = ShareCalculator::new(&registry, &ledger);
        assert_eq!(calc.share_proportion(pool(), Some(user())), None);
        assert_eq!(calc.liquidity_contribution(pool(), token_a(), Some(user())).unwrap(), None);
    }

    #[test]
    fn contribution_for_foreign_token_fails() {
        let (registry, ledger) = setup(Some(dec!(1000)), Some(dec!(250)));
        let calc = ShareCalculator::new(&registry, &ledger);
        let result = calc.liquidity_contribution(pool(), Address::repeat_byte(0xff), Some(user()));
        assert!(matches!(result, Err(PoolError::TokenNotFound { .. })));

        // Token errors win over a missing account.
        let result = calc.liquidity_contribution(pool(), Address::repeat_byte(0xff), None);
        assert!(matches!(result, Err(PoolError::TokenNotFound { .. })));
    }

    #[test]
    fn user_value_uses_prices() {
        let (registry, ledger) = setup(Some(dec!(1000)), Some(dec!(250)));
        let calc = ShareCalculator::new(&registry, &ledger);
        let prices: HashMap<Address, Decimal> =
            [(token_a(), dec!(2)), (token_b(), dec!(0.5))].into_iter().collect();

        assert_eq!(calc.total_pool_value(pool(), &prices).unwrap(), Some(dec!(300)));
        assert_eq!(calc.user_liquidity_value(pool(), Some(user()), &prices).unwrap(), Some(dec!(75)));
        assert_eq!(calc.user_liquidity_value(pool(), None, &prices).unwrap(), None);

        let partial: HashMap<Address, Decimal> = [(token_a(), dec!(2))].into_iter().collect();
        assert_eq!(calc.user_liquidity_value(pool(), Some(user()), &partial).unwrap(), None);
    }

    #[test]
    fn pool_tokens_for_ratio_truncates() {
        let (registry, ledger) = setup(Some(dec!(1000)), None);
        let calc = ShareCalculator::new(&registry, &ledger);

        assert_eq!(calc.pool_tokens_for_ratio(pool(), dec!(0.105)).unwrap(), Some(dec!(105)));
        assert_eq!(calc.pool_tokens_for_ratio(pool(), dec!(0.1059)).unwrap(), Some(dec!(105)));
        assert_eq!(calc.pool_tokens_for_ratio(pool(), dec!(1)).unwrap(), Some(dec!(1000)));
        assert!(matches!(
            calc.pool_tokens_for_ratio(pool(), dec!(1.01)),
            Err(PoolError::InvalidRatio { .. })
        ));
    }

    #[test]
    fn pool_tokens_for_ratio_without_supply() {
        let (registry, ledger) = setup(None, None);
        let calc = ShareCalculator::new(&registry, &ledger);
        assert_eq!(calc.pool_tokens_for_ratio(pool(), dec!(0.5)).unwrap(), None);
    }

    #[test]
    fn token_amounts_follow_token_order() {
        let (registry, ledger) = setup(Some(dec!(1000)), None);
        let calc = ShareCalculator::new(&registry, &ledger);
        assert_eq!(
            calc.token_amounts_for_ratio(pool(), dec!(0.1)).unwrap(),
            vec![dec!(10), dec!(20)]
        );
    }

    #[test]
    fn zeroed_vector_matches_token_count() {
        let (registry, ledger) = setup(None, None);
        let calc = ShareCalculator::new(&registry, &ledger);
        let zeros = calc.zeroed_output_vector(pool()).unwrap();
        assert_eq!(zeros.len(), 2);
        assert!(zeros.iter().all(|z| z == "0"));
        assert!(calc.zeroed_output_vector(Address::ZERO).is_err());
    }
}
