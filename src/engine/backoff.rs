// src/engine/backoff.rs

use std::time::Duration;

const MAX_EXPONENT: u32 = 6;
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Exponential backoff: 1s, 2s, 4s, ... capped at 60s.
#[derive(Debug, Clone, Default)]
pub struct ExpBackoff {
    attempt: u32,
}

impl ExpBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay for the current attempt; advances the attempt counter until the
    /// cap is reached.
    pub fn delay(&mut self) -> Duration {
        let delay = Duration::from_secs(1u64 << self.attempt.min(MAX_EXPONENT)).min(MAX_DELAY);
        if delay < MAX_DELAY {
            self.attempt += 1;
        }
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
