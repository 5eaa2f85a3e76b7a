//! Subgraph response payloads and their conversion into snapshots

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use crate::{
    errors::{PoolError, PoolResult},
    types::{PoolSnapshot, PoolToken},
};

#[derive(Debug, Deserialize)]
pub struct GraphResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PoolsData {
    pub pools: Vec<SubgraphPool>,
}

#[derive(Debug, Deserialize)]
pub struct PoolData {
    pub pool: Option<SubgraphPool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphPool {
    pub id: String,
    pub finalized: bool,
    pub swap_fee: Decimal,
    #[serde(default)]
    pub total_weight: Decimal,
    #[serde(default)]
    pub tokens_list: Vec<String>,
    #[serde(default)]
    pub tokens: Vec<SubgraphToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphToken {
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: u8,
    pub balance: Decimal,
    pub denorm_weight: Decimal,
}

fn parse_address(raw: &str, context: &str) -> PoolResult<Address> {
    Address::from_str(raw).map_err(|e| PoolError::DataParsing {
        context: format!("{}: bad address {}", context, raw),
        source: e.into(),
    })
}

impl TryFrom<SubgraphPool> for PoolSnapshot {
    type Error = PoolError;

    /// Tokens are reordered to follow `tokensList`, which is the order the
    /// pool contract expects amounts in.
    fn try_from(pool: SubgraphPool) -> PoolResult<Self> {
        let address = parse_address(&pool.id, "pool id")?;

        let mut unordered = pool
            .tokens
            .into_iter()
            .map(|token| {
                Ok(PoolToken {
                    address: parse_address(&token.address, "pool token")?,
                    symbol: token.symbol.unwrap_or_else(|| "?".to_string()),
                    decimals: token.decimals,
                    balance: token.balance,
                    denorm_weight: token.denorm_weight,
                })
            })
            .collect::<PoolResult<Vec<_>>>()?;

        let tokens_list = pool
            .tokens_list
            .iter()
            .map(|raw| parse_address(raw, "tokensList"))
            .collect::<PoolResult<Vec<_>>>()?;

        let mut tokens = Vec::with_capacity(tokens_list.len());
        for listed in &tokens_list {
            let position = unordered
                .iter()
                .position(|t| t.address == *listed)
                .ok_or_else(|| PoolError::DataParsing {
                    context: format!("pool {}", address),
                    source: anyhow::anyhow!("tokensList entry {} has no token record", listed),
                })?;
            tokens.push(unordered.swap_remove(position));
        }

        Ok(PoolSnapshot {
            address,
            tokens,
            swap_fee: pool.swap_fee,
            finalized: pool.finalized,
            tokens_list,
            pool_token: address,
            total_weight: pool.total_weight,
        })
    }
}
