//! Bounded retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::BrokerConfig;
use crate::resilience::backoff::calculate_backoff;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_broker_config(config: &BrokerConfig) -> Self {
        Self {
            max_attempts: config.connect_max_attempts.max(1),
            base_delay_ms: config.connect_base_delay_ms,
            max_delay_ms: config.connect_max_delay_ms,
        }
    }

    /// Delay to sleep after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_broker_config(&BrokerConfig::default())
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` attempts have failed.
/// Returns the last error on exhaustion.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(what, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt >= policy.max_attempts => {
                tracing::error!(what, attempt, error = %e, "Giving up after final attempt");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(what, attempt, delay = ?delay, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
