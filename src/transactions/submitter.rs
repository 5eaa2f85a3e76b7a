//! Transaction submission against pool contracts

use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::RpcError,
};
use anyhow::Context;
use chrono::Utc;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use crate::{
    config::Config,
    errors::{PoolError, PoolResult},
    types::{PoolCall, TransactionHandle, TransactionStatus},
};

/// Executes join/exit calls. Failures are surfaced as-is and never retried.
pub trait TransactionSubmitter {
    fn submit(&self, call: PoolCall) -> impl Future<Output = PoolResult<TransactionHandle>> + Send;
}

/// Signs with a local key and sends through the configured RPC endpoint.
pub struct ChainSubmitter {
    provider: Arc<dyn Provider>,
    wait_for_receipt: bool,
}

impl ChainSubmitter {
    pub async fn new(config: &Config) -> PoolResult<Self> {
        let key = config
            .private_key
            .as_ref()
            .ok_or_else(|| PoolError::Config("PRIVATE_KEY is required to submit transactions".to_string()))?;
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| PoolError::Config(format!("Failed to parse private key: {}", e)))?;

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_builtin(&config.rpc_url)
            .await
            .map_err(|e| PoolError::Network {
                message: format!("Failed to connect signer to {}", config.rpc_url),
                source: Some(e.into()),
                retry_count: 0,
            })?;

        Ok(Self {
            provider: Arc::new(provider),
            wait_for_receipt: config.confirm_transactions,
        })
    }
}

impl TransactionSubmitter for ChainSubmitter {
    async fn submit(&self, call: PoolCall) -> PoolResult<TransactionHandle> {
        let pool = call.pool();
        let method = call.method();
        let tx = TransactionRequest::default()
            .to(pool)
            .input(call.calldata().into());

        info!("🚀 Submitting {} on {}", method, pool);
        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            let rejected = matches!(e, RpcError::ErrorResp(_));
            let source = anyhow::Error::from(e);
            if rejected {
                PoolError::TransactionRejected { pool, method: method.to_string(), source }
            } else {
                PoolError::TransactionFailed { pool, method: method.to_string(), source }
            }
        })?;
        let tx_hash = *pending.tx_hash();

        let status = if self.wait_for_receipt {
            let receipt = pending
                .get_receipt()
                .await
                .context("Failed to await receipt")
                .map_err(|source| PoolError::TransactionFailed {
                    pool,
                    method: method.to_string(),
                    source,
                })?;
            if receipt.status() {
                TransactionStatus::Confirmed
            } else {
                warn!("Transaction {} reverted", tx_hash);
                TransactionStatus::Reverted
            }
        } else {
            TransactionStatus::Pending
        };

        Ok(TransactionHandle {
            id: uuid::Uuid::new_v4(),
            pool,
            method,
            tx_hash: Some(tx_hash),
            status,
            submitted_at: Utc::now(),
        })
    }
}

/// Logs calls instead of sending them; used when no key is configured.
#[derive(Default)]
pub struct DryRunSubmitter {
    submitted: Mutex<Vec<PoolCall>>,
}

impl DryRunSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<PoolCall> {
        self.submitted.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl TransactionSubmitter for DryRunSubmitter {
    async fn submit(&self, call: PoolCall) -> PoolResult<TransactionHandle> {
        info!(
            "🎭 Dry run: {} on {} with calldata 0x{}",
            call.method(),
            call.pool(),
            alloy::hex::encode(call.calldata())
        );
        let handle = TransactionHandle {
            id: uuid::Uuid::new_v4(),
            pool: call.pool(),
            method: call.method(),
            tx_hash: None,
            status: TransactionStatus::Simulated,
            submitted_at: Utc::now(),
        };
        if let Ok(mut calls) = self.submitted.lock() {
            calls.push(call);
        }
        Ok(handle)
    }
}
