//! Dashboard configuration and environment variable handling

use alloy::primitives::Address;
use rust_decimal::prelude::*;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use crate::errors::{PoolError, PoolResult};

// Configuration constants
pub const DEFAULT_SUBGRAPH_URL: &str = "https://api.thegraph.com/subgraphs/name/balancer-labs/balancer";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const MIN_POLL_INTERVAL_SECS: u64 = 2;
pub const MAX_POLL_INTERVAL_SECS: u64 = 600;
pub const HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_DIR: &str = "output/logs";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub subgraph_url: String,
    pub poll_interval_secs: u64,
    /// Connected account; share values stay undefined without it.
    pub account: Option<Address>,
    pub private_key: Option<String>,
    /// Only pools containing all of these tokens are fetched.
    pub token_index: Vec<Address>,
    pub exit_pool: Option<Address>,
    pub exit_ratio: Option<Decimal>,
    pub confirm_transactions: bool,
    /// Static USD prices as `token=price` pairs; pool values are undefined
    /// for pools with an unpriced token.
    pub token_prices: HashMap<Address, Decimal>,
    pub log_dir: String,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; malformed values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            rpc_url: lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            subgraph_url: lookup("SUBGRAPH_URL")
                .unwrap_or_else(|| DEFAULT_SUBGRAPH_URL.to_string()),
            poll_interval_secs: lookup("POLL_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(MIN_POLL_INTERVAL_SECS)
                .min(MAX_POLL_INTERVAL_SECS),
            account: lookup("ACCOUNT").and_then(|s| Address::from_str(s.trim()).ok()),
            private_key: lookup("PRIVATE_KEY").filter(|s| !s.trim().is_empty()),
            token_index: lookup("TOKEN_INDEX")
                .map(|s| {
                    s.split(',')
                        .filter_map(|part| Address::from_str(part.trim()).ok())
                        .collect()
                })
                .unwrap_or_default(),
            exit_pool: lookup("EXIT_POOL").and_then(|s| Address::from_str(s.trim()).ok()),
            exit_ratio: lookup("EXIT_RATIO").and_then(|s| Decimal::from_str(s.trim()).ok()),
            confirm_transactions: lookup("CONFIRM_TRANSACTIONS")
                .unwrap_or_else(|| "true".to_string())
                .parse()
                .unwrap_or(true),
            token_prices: lookup("TOKEN_PRICES")
                .map(|s| parse_prices(&s))
                .unwrap_or_default(),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        }
    }

    pub fn validate(&self) -> PoolResult<()> {
        if let Some(ratio) = self.exit_ratio {
            if ratio <= Decimal::ZERO || ratio > Decimal::ONE {
                return Err(PoolError::Config(format!("EXIT_RATIO must be in (0, 1], got {}", ratio)));
            }
            if self.exit_pool.is_none() {
                return Err(PoolError::Config("EXIT_RATIO set without EXIT_POOL".to_string()));
            }
        }
        if self.private_key.is_some() && self.account.is_none() {
            return Err(PoolError::Config("PRIVATE_KEY set without ACCOUNT".to_string()));
        }
        Ok(())
    }
}

fn parse_prices(raw: &str) -> HashMap<Address, Decimal> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, price) = pair.split_once('=')?;
            Some((
                Address::from_str(token.trim()).ok()?,
                Decimal::from_str(price.trim()).ok()?,
            ))
        })
        .collect()
}
