//! Refresh driver: block number + query layer -> registry merge

use alloy::primitives::Address;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use crate::{
    errors::PoolResult,
    registry::PoolRegistry,
    types::{MergeOutcome, PoolSnapshot},
};

/// Source of pool snapshots (the subgraph in production).
pub trait PoolQuery {
    /// Finalized pools, optionally restricted to those containing every token
    /// in `token_index`.
    fn fetch_public_pools(
        &self,
        token_index: &[Address],
    ) -> impl Future<Output = PoolResult<Vec<PoolSnapshot>>> + Send;

    fn fetch_pool(
        &self,
        address: Address,
    ) -> impl Future<Output = PoolResult<Option<PoolSnapshot>>> + Send;
}

/// Current chain height, used purely as a freshness counter.
pub trait ChainHead {
    fn block_number(&self) -> impl Future<Output = PoolResult<u64>> + Send;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub block: u64,
    pub fetched: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub stale: usize,
}

impl RefreshReport {
    fn record(&mut self, outcome: MergeOutcome) {
        self.fetched += 1;
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Replaced { .. } => self.replaced += 1,
            MergeOutcome::Stale { .. } => self.stale += 1,
        }
    }
}

pub struct PoolSync<Q, H> {
    registry: Arc<PoolRegistry>,
    query: Q,
    head: H,
}

impl<Q: PoolQuery, H: ChainHead> PoolSync<Q, H> {
    pub fn new(registry: Arc<PoolRegistry>, query: Q, head: H) -> Self {
        Self { registry, query, head }
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Fetch all public pools and merge them at the block read *before* the
    /// query was issued, so a snapshot is never credited to a later block than
    /// the data it could contain.
    pub async fn refresh(&self, token_index: &[Address]) -> PoolResult<RefreshReport> {
        let block = self.head.block_number().await?;
        let pools = self.query.fetch_public_pools(token_index).await?;

        let mut report = RefreshReport { block, ..Default::default() };
        for snapshot in pools {
            let outcome = self.registry.merge(snapshot.address, snapshot, block);
            report.record(outcome);
        }

        info!(
            block,
            fetched = report.fetched,
            inserted = report.inserted,
            replaced = report.replaced,
            stale = report.stale,
            "Pool refresh complete"
        );
        Ok(report)
    }

    /// Refresh a single pool. Returns `None` if the query layer does not know it.
    pub async fn refresh_pool(&self, address: Address) -> PoolResult<Option<MergeOutcome>> {
        let block = self.head.block_number().await?;
        match self.query.fetch_pool(address).await? {
            Some(snapshot) => Ok(Some(self.registry.merge(address, snapshot, block))),
            None => {
                debug!(pool = %address, block, "Query layer returned no pool");
                Ok(None)
            }
        }
    }
}
