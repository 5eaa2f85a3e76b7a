//! Custom error types for pool lookups, share math and chain collaborators

use alloy::primitives::Address;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Pool not found: {pool}")]
    PoolNotFound { pool: Address },

    #[error("Token {token} is not a constituent of pool {pool}")]
    TokenNotFound { pool: Address, token: Address },

    #[error("Pool {pool} is not finalized")]
    NotFinalized { pool: Address },

    #[error("Invalid address: {input}")]
    InvalidAddress { input: String },

    #[error("Ratio {ratio} is outside [0, 1]")]
    InvalidRatio { ratio: Decimal },

    #[error("Total supply of pool {pool} is not loaded")]
    SupplyUnavailable { pool: Address },

    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Decimal, reason: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        retry_count: u32,
    },

    #[error("Data parsing error: {context}")]
    DataParsing {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transaction rejected: {method} on {pool}")]
    TransactionRejected {
        pool: Address,
        method: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transaction failed: {method} on {pool}")]
    TransactionFailed {
        pool: Address,
        method: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type PoolResult<T> = Result<T, PoolError>;

impl PoolError {
    /// Missing pools and tokens are the only failures a caller is expected to
    /// render as "absent" rather than report.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::PoolNotFound { .. } | PoolError::TokenNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let pool = Address::repeat_byte(0x11);
        assert!(PoolError::PoolNotFound { pool }.is_not_found());
        assert!(PoolError::TokenNotFound { pool, token: Address::ZERO }.is_not_found());
        assert!(!PoolError::NotFinalized { pool }.is_not_found());
    }

    #[test]
    fn messages_name_the_pool() {
        let pool = Address::repeat_byte(0x22);
        let msg = PoolError::NotFinalized { pool }.to_string();
        assert!(msg.contains(&pool.to_string()));
    }
}
