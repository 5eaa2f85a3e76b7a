//! Join/exit transaction types

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolMethod {
    JoinPool,
    ExitPool,
}

impl PoolMethod {
    pub fn signature(&self) -> &'static str {
        match self {
            PoolMethod::JoinPool => "joinPool(uint256,uint256[])",
            PoolMethod::ExitPool => "exitPool(uint256,uint256[])",
        }
    }
}

impl fmt::Display for PoolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolMethod::JoinPool => write!(f, "joinPool"),
            PoolMethod::ExitPool => write!(f, "exitPool"),
        }
    }
}

/// A fully specified call against a pool contract, amounts in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolCall {
    JoinPool {
        pool: Address,
        pool_amount_out: U256,
        max_amounts_in: Vec<U256>,
    },
    ExitPool {
        pool: Address,
        pool_amount_in: U256,
        min_amounts_out: Vec<U256>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Reverted,
    Simulated,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionHandle {
    pub id: Uuid,
    pub pool: Address,
    pub method: PoolMethod,
    pub tx_hash: Option<TxHash>,
    pub status: TransactionStatus,
    pub submitted_at: DateTime<Utc>,
}
