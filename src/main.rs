//! Pool dashboard - Main Entry Point
//!
//! Polls the pools subgraph, keeps the registry fresh and logs the connected
//! account's position in every public pool.

use bpool_dashboard::*;
use anyhow::Result;
use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn, error, debug};
use crate::{
    network::RpcChainHead,
    shares::BalanceLookup,
    subgraph::SubgraphClient,
    tokens::{BalanceBook, BalanceFetcher},
    transactions::{ChainSubmitter, DryRunSubmitter, TransactionSubmitter},
};

type DashboardSync = PoolSync<SubgraphClient, RpcChainHead>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = CONFIG.clone();

    // Initialize logging
    let _logging_guard = utils::setup_logging(&config.log_dir)?;

    info!("🏊 Pool Dashboard v0.3.0");
    info!("📋 Configuration:");
    info!("   RPC: {}", config.rpc_url);
    info!("   Subgraph: {}", config.subgraph_url);
    info!("   Poll interval: {}s", config.poll_interval_secs);
    info!("   Account: {}", config.account.map(|a| a.to_string()).unwrap_or_else(|| "not connected".to_string()));
    info!("   Token filter: {} tokens", config.token_index.len());
    config.validate()?;

    // Setup collaborators
    let provider = network::setup_provider(&config).await?;
    let registry = Arc::new(PoolRegistry::new());
    let subgraph = SubgraphClient::new(
        config.subgraph_url.clone(),
        Duration::from_secs(config::HTTP_TIMEOUT_SECS),
    )?;
    let sync = PoolSync::new(Arc::clone(&registry), subgraph, RpcChainHead::new(Arc::clone(&provider)));
    let book = BalanceBook::new();
    let fetcher = BalanceFetcher::new(Arc::clone(&provider));

    let mut events = registry.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(pool = %event.pool, block = event.block, outcome = ?event.outcome, "Registry updated");
        }
    });

    // Setup shutdown handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("\n📛 Received shutdown signal (Ctrl+C)...");
            let _ = shutdown_tx.send(());
        }
    });

    let mut pending_exit = config.exit_pool.zip(config.exit_ratio);
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));

    info!("\n🚀 Starting refresh loop...\n");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = run_refresh_cycle(&sync, &fetcher, &book, &config).await {
                    error!("Refresh cycle error: {}", e);
                    continue;
                }

                if let Some((pool, ratio)) = pending_exit.take() {
                    let outcome = if config.private_key.is_some() {
                        match ChainSubmitter::new(&config).await {
                            Ok(submitter) => submit_exit(&submitter, &registry, &book, pool, ratio).await,
                            Err(e) => Err(e),
                        }
                    } else {
                        submit_exit(&DryRunSubmitter::new(), &registry, &book, pool, ratio).await
                    };
                    if let Err(e) = outcome {
                        error!("Exit from {} failed: {}", pool, e);
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received, exiting main loop...");
                break;
            }
        }
    }

    info!("Tracked {} pools up to block {:?}", registry.len(), registry.latest_block());
    Ok(())
}

/// Refresh the registry and print every public pool with the account's share.
async fn run_refresh_cycle(
    sync: &DashboardSync,
    fetcher: &BalanceFetcher,
    book: &BalanceBook,
    config: &Config,
) -> Result<()> {
    let report = sync.refresh(&config.token_index).await?;
    let registry = sync.registry();

    for snapshot in registry.list_finalized() {
        if let Err(e) = fetcher.refresh(book, snapshot.pool_token, config.account).await {
            warn!("⚠️ Could not load balances for {}: {}", snapshot.address, e);
        }

        let calc = ShareCalculator::new(registry, book);
        let share = calc.share_proportion(snapshot.address, config.account);
        let contributions = utils::position_contributions(&calc, &snapshot, config.account);
        let value = calc.user_liquidity_value(snapshot.address, config.account, &config.token_prices)?;

        utils::print_pool_summary(&snapshot, report.block);
        if let Some(account) = config.account {
            let held = book
                .user_balance(snapshot.pool_token, account)
                .and_then(|raw| raw.checked_div(utils::pow10(i32::from(POOL_TOKEN_DECIMALS))));
            debug!("   Pool tokens held: {}", utils::format_optional(held, 6));
            utils::print_position(&snapshot, share, &contributions, value);
        }
    }

    Ok(())
}

async fn submit_exit<S: TransactionSubmitter>(
    submitter: &S,
    registry: &PoolRegistry,
    book: &BalanceBook,
    pool: Address,
    ratio: Decimal,
) -> PoolResult<()> {
    registry.get_finalized(pool)?;
    let calc = ShareCalculator::new(registry, book);
    let call = transactions::build_exit(&calc, pool, ratio)?;
    let handle = submitter.submit(call).await?;
    utils::print_transaction(&handle);
    Ok(())
}
