use std::time::Duration;

use rand::Rng;

use crate::types::constants::RECONNECT_JITTER_MS;

/// Exponential backoff with jitter for reconnection attempts.
///
/// Attempt `n` (1-indexed) waits `min(base * 2^n, cap)` plus up to one second
/// of uniform jitter so that a fleet of clients dropped by the same outage
/// does not reconnect in lockstep.
pub struct Backoff {
    attempts: u32,
    base: Duration,
    cap: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            base,
            cap,
            max_attempts,
        }
    }

    /// Attempts consumed so far
    pub fn attempt(&self) -> u32 {
        self.attempts
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;

        let exponential = self
            .base
            .saturating_mul(2u32.saturating_pow(self.attempts));
        let delay = exponential.min(self.cap);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=RECONNECT_JITTER_MS));
        Some(delay + jitter)
    }

    /// Reset after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
