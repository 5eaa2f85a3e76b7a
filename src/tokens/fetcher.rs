//! ERC-20 balance and supply reads for pool tokens

use alloy::{
    primitives::{Address, keccak256, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
    sol_types::SolValue,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;
use crate::{
    errors::PoolResult,
    network::retry::{retry_with_backoff, RetryConfig},
    tokens::BalanceBook,
    utils::from_base_units,
    ConcreteProvider,
};

pub async fn get_total_supply(provider: &dyn Provider, token: Address) -> Result<U256> {
    let data = keccak256("totalSupply()")[..4].to_vec();
    let tx = TransactionRequest::default().to(token).input(data.into());

    let result = provider.call(&tx).await
        .context("Failed to call totalSupply")?;
    U256::abi_decode(&result, true).context("Failed to decode totalSupply")
}

pub async fn get_balance_of(provider: &dyn Provider, token: Address, account: Address) -> Result<U256> {
    let mut data = keccak256("balanceOf(address)")[..4].to_vec();
    data.extend_from_slice(&account.abi_encode());
    let tx = TransactionRequest::default().to(token).input(data.into());

    let result = provider.call(&tx).await
        .context("Failed to call balanceOf")?;
    U256::abi_decode(&result, true).context("Failed to decode balanceOf")
}

/// Refreshes a [`BalanceBook`] from the chain.
pub struct BalanceFetcher {
    provider: Arc<ConcreteProvider>,
    retry: RetryConfig,
}

impl BalanceFetcher {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
        }
    }

    /// Load the supply of `pool_token` and, if connected, the account's balance.
    pub async fn refresh(
        &self,
        book: &BalanceBook,
        pool_token: Address,
        account: Option<Address>,
    ) -> PoolResult<()> {
        let provider = self.provider.as_ref();

        let supply = retry_with_backoff(
            || get_total_supply(provider, pool_token),
            &self.retry,
            &format!("totalSupply of {}", pool_token),
        ).await?;
        book.set_total_supply(pool_token, from_base_units(supply, 0)?);

        if let Some(account) = account {
            let balance = retry_with_backoff(
                || get_balance_of(provider, pool_token, account),
                &self.retry,
                &format!("balanceOf {} in {}", account, pool_token),
            ).await?;
            book.set_balance(pool_token, account, from_base_units(balance, 0)?);
        }

        debug!(pool_token = %pool_token, ?account, "Refreshed pool token balances");
        Ok(())
    }
}
