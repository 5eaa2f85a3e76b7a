//! Decimal <-> on-chain integer conversions

use alloy::primitives::U256;
use rust_decimal::prelude::*;
use std::str::FromStr;
use rust_decimal_macros::dec;
use crate::errors::{PoolError, PoolResult};

pub fn pow10(n: i32) -> Decimal {
    match n {
        0 => dec!(1),
        6 => dec!(1_000_000),
        18 => dec!(1_000_000_000_000_000_000),
        _ => {
            let mut result = dec!(1);
            if n > 0 {
                for _ in 0..n {
                    result *= dec!(10);
                }
            } else {
                for _ in 0..(-n) {
                    result /= dec!(10);
                }
            }
            result
        }
    }
}

/// Scale a token amount to integer base units, truncating any digits beyond
/// `decimals`. Works on the mantissa so large balances do not overflow.
pub fn to_base_units(amount: Decimal, decimals: u8) -> PoolResult<U256> {
    scale_to_base_units(amount, decimals, false)
}

/// Like [`to_base_units`], but rounds dropped digits up. Use for upper bounds
/// such as a join's max amounts in.
pub fn to_base_units_ceil(amount: Decimal, decimals: u8) -> PoolResult<U256> {
    scale_to_base_units(amount, decimals, true)
}

fn scale_to_base_units(amount: Decimal, decimals: u8, round_up: bool) -> PoolResult<U256> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PoolError::InvalidAmount {
            amount,
            reason: "negative amount".to_string(),
        });
    }

    let mantissa = U256::from(amount.mantissa().unsigned_abs());
    let scale = amount.scale();
    let decimals = u32::from(decimals);
    let overflow = || PoolError::InvalidAmount {
        amount,
        reason: format!("overflow scaling to {} decimals", decimals),
    };

    if decimals >= scale {
        let factor = U256::from(10u8)
            .checked_pow(U256::from(decimals - scale))
            .ok_or_else(overflow)?;
        mantissa.checked_mul(factor).ok_or_else(overflow)
    } else {
        // scale is at most 28, so this power always fits
        let divisor = U256::from(10u8).pow(U256::from(scale - decimals));
        let quotient = mantissa / divisor;
        if round_up && !(mantissa % divisor).is_zero() {
            quotient.checked_add(U256::from(1u8)).ok_or_else(overflow)
        } else {
            Ok(quotient)
        }
    }
}

/// Inverse of [`to_base_units`] for values read from contracts.
pub fn from_base_units(raw: U256, decimals: u8) -> PoolResult<Decimal> {
    let value = Decimal::from_str(&raw.to_string()).map_err(|e| PoolError::DataParsing {
        context: format!("raw amount {} does not fit a decimal", raw),
        source: e.into(),
    })?;
    value
        .checked_div(pow10(i32::from(decimals)))
        .ok_or_else(|| PoolError::InvalidAmount {
            amount: value,
            reason: format!("cannot scale down by {} decimals", decimals),
        })
}
