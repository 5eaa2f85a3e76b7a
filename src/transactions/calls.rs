//! Building and encoding pool join/exit calls

use alloy::{
    primitives::{Address, keccak256, U256},
    sol_types::SolValue,
};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::str::FromStr;
use crate::{
    errors::{PoolError, PoolResult},
    shares::{BalanceLookup, ShareCalculator},
    types::{PoolCall, PoolMethod},
    utils::{to_base_units, to_base_units_ceil},
};

impl PoolCall {
    pub fn pool(&self) -> Address {
        match self {
            PoolCall::JoinPool { pool, .. } | PoolCall::ExitPool { pool, .. } => *pool,
        }
    }

    pub fn method(&self) -> PoolMethod {
        match self {
            PoolCall::JoinPool { .. } => PoolMethod::JoinPool,
            PoolCall::ExitPool { .. } => PoolMethod::ExitPool,
        }
    }

    /// ABI-encoded `joinPool(uint256,uint256[])` / `exitPool(uint256,uint256[])`.
    pub fn calldata(&self) -> Vec<u8> {
        let (amount, limits) = match self {
            PoolCall::JoinPool { pool_amount_out, max_amounts_in, .. } => (*pool_amount_out, max_amounts_in),
            PoolCall::ExitPool { pool_amount_in, min_amounts_out, .. } => (*pool_amount_in, min_amounts_out),
        };
        let mut data = keccak256(self.method().signature())[..4].to_vec();
        data.extend_from_slice(&(amount, limits.clone()).abi_encode_params());
        data
    }
}

fn parse_limits(limits: &[String]) -> PoolResult<Vec<U256>> {
    limits
        .iter()
        .map(|raw| {
            U256::from_str(raw).map_err(|e| PoolError::DataParsing {
                context: format!("amount limit {}", raw),
                source: e.into(),
            })
        })
        .collect()
}

/// Exit `ratio` of the pool's supply, accepting any amount out.
pub fn build_exit<B: BalanceLookup>(
    calc: &ShareCalculator<'_, B>,
    pool: Address,
    ratio: Decimal,
) -> PoolResult<PoolCall> {
    let pool_amount_in = calc
        .pool_tokens_for_ratio(pool, ratio)?
        .ok_or(PoolError::SupplyUnavailable { pool })?;
    if pool_amount_in.is_zero() {
        return Err(PoolError::InvalidAmount {
            amount: pool_amount_in,
            reason: format!("ratio {} is below one pool token unit", ratio),
        });
    }

    Ok(PoolCall::ExitPool {
        pool,
        pool_amount_in: to_base_units(pool_amount_in, 0)?,
        min_amounts_out: parse_limits(&calc.zeroed_output_vector(pool)?)?,
    })
}

/// Join for `ratio` of the current supply, allowing each token amount to
/// exceed its proportional value by `slippage`. Max amounts round up so a
/// zero-slippage join is never short by a base unit.
pub fn build_join<B: BalanceLookup>(
    calc: &ShareCalculator<'_, B>,
    pool: Address,
    ratio: Decimal,
    slippage: Decimal,
) -> PoolResult<PoolCall> {
    if slippage < dec!(0) {
        return Err(PoolError::InvalidAmount {
            amount: slippage,
            reason: "negative slippage".to_string(),
        });
    }
    let pool_amount_out = calc
        .pool_tokens_for_ratio(pool, ratio)?
        .ok_or(PoolError::SupplyUnavailable { pool })?;

    let snapshot = calc.snapshot(pool)?;
    let amounts = calc.token_amounts_for_ratio(pool, ratio)?;
    let max_amounts_in = snapshot
        .tokens
        .iter()
        .zip(amounts)
        .map(|(token, amount)| {
            let bounded = amount.checked_mul(dec!(1) + slippage).ok_or_else(|| PoolError::InvalidAmount {
                amount,
                reason: format!("overflow applying slippage to {}", token.symbol),
            })?;
            to_base_units_ceil(bounded, token.decimals)
        })
        .collect::<PoolResult<Vec<_>>>()?;

    Ok(PoolCall::JoinPool {
        pool,
        pool_amount_out: to_base_units(pool_amount_out, 0)?,
        max_amounts_in,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PoolRegistry;
    use crate::registry::store::fixtures::{snapshot, token};
    use crate::tokens::BalanceBook;

    fn pool() -> Address {
        Address::repeat_byte(0x70)
    }

    fn setup(supply: Option<Decimal>) -> (PoolRegistry, BalanceBook) {
        let registry = PoolRegistry::new();
        let mut usdc = token(0x02, "USDC", dec!(200));
        usdc.decimals = 6;
        registry.merge(pool(), snapshot(pool(), vec![token(0x01, "WETH", dec!(100)), usdc], true), 1);
        let book = BalanceBook::new();
        if let Some(supply) = supply {
            book.set_total_supply(pool(), supply);
        }
        (registry, book)
    }

    #[test]
    fn exit_truncates_pool_amount_and_zeroes_limits() {
        let (registry, book) = setup(Some(dec!(1000)));
        let calc = ShareCalculator::new(&registry, &book);

        let call = build_exit(&calc, pool(), dec!(0.1059)).unwrap();
        assert_eq!(
            call,
            PoolCall::ExitPool {
                pool: pool(),
                pool_amount_in: U256::from(105u64),
                min_amounts_out: vec![U256::ZERO, U256::ZERO],
            }
        );
        assert_eq!(call.method(), PoolMethod::ExitPool);
    }

    #[test]
    fn exit_needs_supply() {
        let (registry, book) = setup(None);
        let calc = ShareCalculator::new(&registry, &book);
        assert!(matches!(
            build_exit(&calc, pool(), dec!(0.5)),
            Err(PoolError::SupplyUnavailable { .. })
        ));
    }

    #[test]
    fn dust_exit_is_rejected() {
        let (registry, book) = setup(Some(dec!(1000)));
        let calc = ShareCalculator::new(&registry, &book);
        assert!(matches!(
            build_exit(&calc, pool(), dec!(0.0001)),
            Err(PoolError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn join_scales_each_token_by_its_decimals() {
        let (registry, book) = setup(Some(dec!(1000)));
        let calc = ShareCalculator::new(&registry, &book);

        let call = build_join(&calc, pool(), dec!(0.1), dec!(0.01)).unwrap();
        let PoolCall::JoinPool { pool_amount_out, max_amounts_in, .. } = call else {
            panic!("expected a join");
        };
        assert_eq!(pool_amount_out, U256::from(100u64));
        // 10.1 WETH at 18 decimals, 20.2 USDC at 6 decimals.
        assert_eq!(max_amounts_in[0], U256::from(101u64) * U256::from(10u64).pow(U256::from(17u64)));
        assert_eq!(max_amounts_in[1], U256::from(20_200_000u64));
    }

    #[test]
    fn zero_slippage_join_rounds_max_in_up() {
        let (registry, book) = setup(Some(dec!(1000)));
        let calc = ShareCalculator::new(&registry, &book);

        // 200 USDC * 0.001234567 = 0.2469134, one digit past USDC's 6 decimals.
        let call = build_join(&calc, pool(), dec!(0.001234567), dec!(0)).unwrap();
        let PoolCall::JoinPool { pool_amount_out, max_amounts_in, .. } = call else {
            panic!("expected a join");
        };
        assert_eq!(pool_amount_out, U256::from(1u64));
        assert_eq!(max_amounts_in[1], U256::from(246_914u64));
    }

    #[test]
    fn join_rejects_absurd_token_decimals() {
        let registry = PoolRegistry::new();
        let mut odd = token(0x03, "ODD", dec!(5));
        odd.decimals = 90;
        registry.merge(pool(), snapshot(pool(), vec![odd], true), 1);
        let book = BalanceBook::new();
        book.set_total_supply(pool(), dec!(1000));
        let calc = ShareCalculator::new(&registry, &book);

        assert!(matches!(
            build_join(&calc, pool(), dec!(0.5), dec!(0.01)),
            Err(PoolError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn calldata_layout() {
        let call = PoolCall::ExitPool {
            pool: pool(),
            pool_amount_in: U256::from(105u64),
            min_amounts_out: vec![U256::ZERO, U256::ZERO],
        };
        let data = call.calldata();
        assert_eq!(&data[..4], &keccak256("exitPool(uint256,uint256[])")[..4]);
        // selector + amount + offset + length + two elements
        assert_eq!(data.len(), 4 + 32 * 5);
        assert_eq!(U256::from_be_slice(&data[4..36]), U256::from(105u64));
    }
}
