//! Chain provider setup and block height reads

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    config::Config,
    errors::PoolResult,
    network::retry::{retry_with_backoff, RetryConfig},
    registry::ChainHead,
    ConcreteProvider,
};

pub async fn setup_provider(config: &Config) -> Result<Arc<ConcreteProvider>> {
    let provider: Arc<ConcreteProvider> = Arc::new(
        ProviderBuilder::new()
            .on_http(config.rpc_url.parse().context("Invalid RPC_URL")?)
            .boxed()
    );

    info!("🔗 Testing connection to {}...", config.rpc_url);
    let block = retry_with_backoff(
        || async {
            provider.get_block_number().await
                .context("Failed to get block number")
        },
        &RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10000,
            exponential_base: 2.0,
        },
        "chain connection",
    ).await
    .map_err(|e| {
        warn!("⚠️ Network connection attempt failed: {}", e);
        anyhow::anyhow!("Network connection failed: {}", e)
    })?;

    info!("✅ Connected at block {}", block);
    Ok(provider)
}

/// [`ChainHead`] backed by `eth_blockNumber`.
#[derive(Clone)]
pub struct RpcChainHead {
    provider: Arc<ConcreteProvider>,
    retry: RetryConfig,
}

impl RpcChainHead {
    pub fn new(provider: Arc<ConcreteProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
        }
    }
}

impl ChainHead for RpcChainHead {
    async fn block_number(&self) -> PoolResult<u64> {
        retry_with_backoff(
            || async {
                self.provider.get_block_number().await
                    .context("Failed to get block number")
            },
            &self.retry,
            "block number",
        ).await
    }
}
