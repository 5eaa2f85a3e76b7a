//! Retry logic with exponential backoff for read-only collaborator calls

use std::future::Future;
use std::time::Duration;
use anyhow::Result;
use tracing::warn;
use crate::errors::{PoolError, PoolResult};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `attempt + 1`, before jitter.
    fn backoff(&self, attempt: u32) -> u64 {
        let factor = self.exponential_base.powi(attempt.saturating_sub(1) as i32);
        ((self.initial_delay_ms as f64 * factor) as u64).min(self.max_delay_ms)
    }
}

/// Run `operation` until it succeeds or `max_attempts` is reached.
///
/// Only for idempotent reads; transaction submission must not go through here.
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    context: &str,
) -> PoolResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_attempts => {
                return Err(PoolError::Network {
                    message: format!("{} failed after {} attempts", context, attempt),
                    source: Some(e),
                    retry_count: attempt,
                });
            }
            Err(e) => {
                let delay = config.backoff(attempt);
                let jitter = (delay as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as i64;
                let delay = delay.saturating_add_signed(jitter);
                warn!(
                    "Attempt {}/{} failed for {}: {}. Retrying in {}ms...",
                    attempt, config.max_attempts, context, e, delay
                );

                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}
