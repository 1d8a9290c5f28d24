//! Token-bucket rate limiter for outbound API calls
//!
//! Call permits accumulate at `calls_per_second` up to a one-second burst
//! capacity and are spent one per admitted call. Refill and deduction happen
//! under a single async mutex so two waiters can never spend the same token,
//! and waiters are served in lock-acquisition order.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::error::{ConnectorError, ConnectorResult};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter shared by all calls of one connector instance.
pub struct RateLimiter {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Create a limiter admitting `calls_per_second` sustained calls.
    ///
    /// Capacity defaults to one second of burst (at least one token).
    /// A non-positive or non-finite rate is a configuration error.
    pub fn new(calls_per_second: f64) -> ConnectorResult<Self> {
        if !calls_per_second.is_finite() || calls_per_second <= 0.0 {
            return Err(ConnectorError::Configuration(format!(
                "rate_limit_calls_per_second must be a positive number, got {calls_per_second}"
            )));
        }

        let capacity = calls_per_second.max(1.0);
        Ok(RateLimiter {
            rate: calls_per_second,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Block until a token is available, then spend it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    trace!(remaining = state.tokens, "Rate limit token acquired");
                    return;
                }

                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };

            trace!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens currently available (after applying any pending refill).
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;
        state.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}
