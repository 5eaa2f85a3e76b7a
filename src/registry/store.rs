//! Pool registry keyed by address, reconciled by fetch block number

use alloy::primitives::Address;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use crate::{
    errors::{PoolError, PoolResult},
    types::{MergeOutcome, PoolRecord, PoolSnapshot, PoolToken, RegistryEvent},
};

const EVENT_CAPACITY: usize = 256;

/// Process-lifetime store of the freshest snapshot seen per pool.
///
/// Constructed once at startup and shared as `Arc<PoolRegistry>`. `merge` is the
/// only write path; it holds the per-key entry lock while comparing blocks, so
/// racing fetches for one address converge to the highest block regardless of
/// completion order.
pub struct PoolRegistry {
    pools: DashMap<Address, PoolRecord>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pools: DashMap::new(),
            events,
        }
    }

    pub fn merge(&self, address: Address, snapshot: PoolSnapshot, fetched_at_block: u64) -> MergeOutcome {
        let outcome = match self.pools.entry(address) {
            Entry::Vacant(slot) => {
                slot.insert(PoolRecord {
                    block_last_fetched: fetched_at_block,
                    snapshot: Arc::new(snapshot),
                });
                MergeOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                let stored_block = slot.get().block_last_fetched;
                if fetched_at_block > stored_block {
                    slot.insert(PoolRecord {
                        block_last_fetched: fetched_at_block,
                        snapshot: Arc::new(snapshot),
                    });
                    MergeOutcome::Replaced { previous_block: stored_block }
                } else {
                    MergeOutcome::Stale { stored_block }
                }
            }
        };

        match outcome {
            MergeOutcome::Stale { stored_block } => {
                trace!(pool = %address, fetched_at_block, stored_block, "Dropped stale snapshot");
            }
            _ => {
                debug!(pool = %address, block = fetched_at_block, ?outcome, "Merged pool snapshot");
                // No receivers is fine.
                let _ = self.events.send(RegistryEvent {
                    pool: address,
                    block: fetched_at_block,
                    outcome,
                });
            }
        }

        outcome
    }

    pub fn get(&self, address: Address) -> PoolResult<Arc<PoolSnapshot>> {
        self.pools
            .get(&address)
            .map(|record| Arc::clone(&record.snapshot))
            .ok_or(PoolError::PoolNotFound { pool: address })
    }

    /// Like [`get`](Self::get), but only for pools that are publicly joinable.
    pub fn get_finalized(&self, address: Address) -> PoolResult<Arc<PoolSnapshot>> {
        let snapshot = self.get(address)?;
        if !snapshot.finalized {
            return Err(PoolError::NotFinalized { pool: address });
        }
        Ok(snapshot)
    }

    pub fn record(&self, address: Address) -> PoolResult<PoolRecord> {
        self.pools
            .get(&address)
            .map(|record| record.value().clone())
            .ok_or(PoolError::PoolNotFound { pool: address })
    }

    pub fn list_finalized(&self) -> Vec<Arc<PoolSnapshot>> {
        self.pools
            .iter()
            .filter(|record| record.snapshot.finalized)
            .map(|record| Arc::clone(&record.snapshot))
            .collect()
    }

    pub fn get_token(&self, address: Address, token_address: Address) -> PoolResult<PoolToken> {
        let snapshot = self.get(address)?;
        snapshot
            .token(token_address)
            .cloned()
            .ok_or(PoolError::TokenNotFound { pool: address, token: token_address })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Highest block any stored snapshot was fetched at.
    pub fn latest_block(&self) -> Option<u64> {
        self.pools.iter().map(|record| record.block_last_fetched).max()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Parse a user- or route-supplied pool address.
pub fn parse_pool_address(input: &str) -> PoolResult<Address> {
    Address::from_str(input.trim()).map_err(|_| PoolError::InvalidAddress {
        input: input.to_string(),
    })
}
