//! Retry orchestration
//!
//! Bounded exponential backoff around a single remote attempt, scaled by the
//! current network status. Each attempt is raced against a timeout and
//! reported to the rate limiter.

use crate::error::AiError;
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::rate_limiter::RateLimiter;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

/// Total attempts allowed on a slow network, whatever `max_retries` says
const SLOW_MAX_ATTEMPTS: u32 = 5;
/// Extra retries granted on a slow network
const SLOW_EXTRA_RETRIES: u32 = 2;
const SLOW_DELAY_FACTOR: f64 = 1.5;

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Upper bound of the random delay added to each backoff
    pub max_jitter_ms: u64,
    /// Per-attempt timeout, doubled on a slow network
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            max_jitter_ms: 1000,
            attempt_timeout_secs: 15,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Attempts allowed for a status; `None` means do not try at all
    pub fn attempt_budget(&self, max_retries: u32, status: NetworkStatus) -> Option<u32> {
        match status {
            NetworkStatus::Offline => None,
            NetworkStatus::Online => Some(max_retries + 1),
            NetworkStatus::Slow => {
                Some((max_retries + SLOW_EXTRA_RETRIES + 1).min(SLOW_MAX_ATTEMPTS))
            }
        }
    }

    /// Backoff before retry number `attempt` (0 for the first retry)
    pub fn delay_for_attempt(
        &self,
        attempt: u32,
        base_delay: Duration,
        status: NetworkStatus,
    ) -> Duration {
        let exponential = (base_delay.as_millis() as u64)
            .saturating_mul(2u64.saturating_pow(attempt));
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        };

        let mut delay = exponential.saturating_add(jitter) as f64;
        if status == NetworkStatus::Slow {
            delay *= SLOW_DELAY_FACTOR;
        }
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }

    pub fn attempt_timeout(&self, status: NetworkStatus) -> Duration {
        let base = Duration::from_secs(self.attempt_timeout_secs);
        if status == NetworkStatus::Slow {
            base * 2
        } else {
            base
        }
    }
}

/// Runs remote attempts with backoff, timeouts and limiter bookkeeping
pub struct RetryOrchestrator {
    config: RetryConfig,
    limiter: Arc<RateLimiter>,
    network: Arc<NetworkMonitor>,
}

impl RetryOrchestrator {
    pub fn new(config: RetryConfig, limiter: Arc<RateLimiter>, network: Arc<NetworkMonitor>) -> Self {
        Self {
            config,
            limiter,
            network,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// [`Self::with_retry`] with the configured retry count and base delay
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        self.with_retry(operation, self.config.max_retries, self.config.base_delay())
            .await
    }

    /// Call `operation` until it succeeds, fails permanently, or the budget
    /// for the current network status runs out.
    ///
    /// Offline fails fast without calling `operation`. Rate-limit and
    /// invalid-input errors are returned after the first attempt.
    pub async fn with_retry<T, F, Fut>(
        &self,
        mut operation: F,
        max_retries: u32,
        base_delay: Duration,
    ) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let status = self.network.status();
        let Some(max_attempts) = self.config.attempt_budget(max_retries, status) else {
            return Err(AiError::offline());
        };
        let attempt_timeout = self.config.attempt_timeout(status);

        let mut attempt = 0;
        loop {
            let result = match timeout(attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(AiError::timeout(attempt_timeout)),
            };

            let err = match result {
                Ok(value) => {
                    self.limiter.record_success();
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.limiter.record_failure();
            attempt += 1;

            if !err.kind.is_transient() {
                crate::debug_log!("Not retrying {}: {}", err.kind, err.message);
                return Err(err);
            }
            if attempt >= max_attempts {
                crate::warn_log!(
                    "Giving up after {} attempt(s): {} ({})",
                    attempt,
                    err.message,
                    err.kind
                );
                return Err(err);
            }

            let status = self.network.probe().await;
            if status == NetworkStatus::Offline {
                crate::warn_log!("Network went offline, abandoning retries");
                return Err(AiError::offline());
            }

            let delay = self.config.delay_for_attempt(attempt - 1, base_delay, status);
            crate::info_log!(
                "{} on attempt {}/{}, retrying in {:?}",
                err.kind,
                attempt,
                max_attempts,
                delay
            );
            sleep(delay).await;
        }
    }
}
