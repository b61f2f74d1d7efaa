//! Reconnection backoff
//!
//! Exponential delay with jitter, a cap, and a bounded attempt count. The
//! counter resets after every successful connect, so a long-lived session
//! gets the full budget again on its next drop.

use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff for reconnection attempts
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectBackoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
            attempt: 0,
        }
    }

    /// Delay before the next attempt, or `None` when the budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let exp = self.base.saturating_mul(1_u32 << self.attempt.min(16));
        let capped = exp.min(self.max);
        self.attempt += 1;

        // Up to 25% jitter so reconnecting clients spread out
        let jitter_ms = capped.as_millis() as u64 / 4;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        Some(capped + jitter)
    }

    /// Reset after a successful connect
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Attempts consumed since the last reset
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
