//! Display and printing utilities

use alloy::primitives::Address;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn, error};
use crate::{
    errors::{PoolError, PoolResult},
    shares::{BalanceLookup, ShareCalculator},
    types::{PoolSnapshot, TransactionHandle, TransactionStatus},
};

/// Placeholder shown for values that cannot be computed yet.
pub const PLACEHOLDER: &str = "-";

pub fn format_optional(value: Option<Decimal>, precision: u32) -> String {
    value
        .map(|v| v.round_dp(precision).normalize().to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn print_pool_summary(snapshot: &PoolSnapshot, block: u64) {
    info!("\n🏊 Pool {} ({})", snapshot.label(), snapshot.address);
    info!("   Block: {}", block);
    info!("   Swap fee: {}%", (snapshot.swap_fee * dec!(100)).normalize());
    for token in &snapshot.tokens {
        let weight_pct = if snapshot.total_weight.is_zero() {
            Decimal::ZERO
        } else {
            token.denorm_weight / snapshot.total_weight * dec!(100)
        };
        info!(
            "   {:<8} balance {:>24}  weight {:.1}%",
            token.symbol,
            token.balance.normalize(),
            weight_pct
        );
    }
}

/// Per-token share of `account` for display. Lookup failures are logged and
/// shown as the placeholder.
pub fn position_contributions<B: BalanceLookup>(
    calc: &ShareCalculator<'_, B>,
    snapshot: &PoolSnapshot,
    account: Option<Address>,
) -> Vec<(String, Option<Decimal>)> {
    snapshot
        .tokens
        .iter()
        .map(|token| {
            let amount = match calc.liquidity_contribution(snapshot.address, token.address, account) {
                Ok(amount) => amount,
                Err(e) => {
                    warn!("⚠️ No contribution for {} in {}: {}", token.symbol, snapshot.address, e);
                    None
                }
            };
            (token.symbol.clone(), amount)
        })
        .collect()
}

pub fn print_position(
    snapshot: &PoolSnapshot,
    share: Option<Decimal>,
    contributions: &[(String, Option<Decimal>)],
    value: Option<Decimal>,
) {
    info!("   👤 My share: {}%", format_optional(share.map(|s| s * dec!(100)), 4));
    for (symbol, amount) in contributions {
        info!("      {:<8} {}", symbol, format_optional(*amount, 6));
    }
    if value.is_some() {
        info!("      Value: ${}", format_optional(value, 2));
    } else {
        info!("      Value for {}: {}", snapshot.label(), PLACEHOLDER);
    }
}

/// One-line JSON record of a submitted transaction.
pub fn transaction_record(handle: &TransactionHandle) -> PoolResult<String> {
    serde_json::to_string(handle).map_err(|e| PoolError::DataParsing {
        context: format!("serializing transaction {}", handle.id),
        source: e.into(),
    })
}

pub fn print_transaction(handle: &TransactionHandle) {
    match transaction_record(handle) {
        Ok(record) => debug!(transaction_id = %handle.id, %record, "Transaction handle"),
        Err(e) => warn!("Could not serialize transaction {}: {}", handle.id, e),
    }

    match handle.status {
        TransactionStatus::Confirmed | TransactionStatus::Pending | TransactionStatus::Simulated => {
            warn!("\n✅ {} #{}", handle.method, handle.id);
            warn!("   Pool: {}", handle.pool);
            warn!("   Status: {:?}", handle.status);
            if let Some(tx_hash) = &handle.tx_hash {
                warn!("   Tx Hash: {}", tx_hash);
            }
        }
        TransactionStatus::Reverted => {
            error!("\n❌ {} REVERTED #{}", handle.method, handle.id);
            if let Some(tx_hash) = &handle.tx_hash {
                error!("   Tx Hash: {}", tx_hash);
            }
        }
    }
}
