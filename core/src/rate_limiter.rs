//! Rate Limiter Module
//!
//! Client-side sliding window over outgoing AI requests, plus a cooldown that
//! refuses everything for a while after repeated failures. One limiter is
//! shared (behind an `Arc`) by everything that talks to the same backend.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: usize,
    /// Sliding window length in seconds
    pub window_secs: u64,
    /// Consecutive failures tolerated before the cooldown kicks in
    pub max_failures: u32,
    /// Cooldown length in seconds, counted from the last failure
    pub cooldown_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
            max_failures: 3,
            cooldown_secs: 30,
        }
    }
}

impl RateLimitConfig {
    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    /// Admission times inside the current window, oldest first
    request_times: Vec<Instant>,
    failure_count: u32,
    last_failure: Option<Instant>,
}

impl LimiterState {
    fn cleanup_old_entries(&mut self, now: Instant, window: Duration) {
        self.request_times
            .retain(|&t| now.saturating_duration_since(t) < window);
    }

    /// Remaining cooldown, if one is active
    fn cooldown_remaining(&self, now: Instant, config: &RateLimitConfig) -> Option<Duration> {
        if self.failure_count <= config.max_failures {
            return None;
        }
        let last = self.last_failure?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < config.cooldown()).then(|| config.cooldown() - elapsed)
    }
}

/// Snapshot for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub requests_in_window: usize,
    pub max_requests: usize,
    pub failure_count: u32,
    pub cooling_down: bool,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LimiterState::default()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit a request if the cooldown and the window allow it.
    ///
    /// An admitted request is recorded immediately.
    pub fn can_make_request(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();

        if state.cooldown_remaining(now, &self.config).is_some() {
            return false;
        }

        state.cleanup_old_entries(now, self.config.window());
        if state.request_times.len() >= self.config.max_requests {
            return false;
        }

        state.request_times.push(now);
        true
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_sub(1);
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count += 1;
        state.last_failure = Some(Instant::now());
    }

    /// How long until a request could be admitted again
    pub fn time_until_reset(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.state.lock();

        if let Some(remaining) = state.cooldown_remaining(now, &self.config) {
            return remaining;
        }

        state.cleanup_old_entries(now, self.config.window());
        if state.request_times.len() < self.config.max_requests {
            return Duration::ZERO;
        }
        match state.request_times.first() {
            Some(&oldest) => (oldest + self.config.window()).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    pub fn status(&self) -> RateLimitStatus {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.cleanup_old_entries(now, self.config.window());
        RateLimitStatus {
            requests_in_window: state.request_times.len(),
            max_requests: self.config.max_requests,
            failure_count: state.failure_count,
            cooling_down: state.cooldown_remaining(now, &self.config).is_some(),
        }
    }
}
