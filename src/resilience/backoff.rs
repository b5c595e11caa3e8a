//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::PollingConfig;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay schedule between readiness polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBackoff {
    base_ms: u64,
    max_ms: u64,
}

impl PollBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay before poll number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }

    /// Longest delay this schedule can produce, jitter included.
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.max_ms + self.max_ms / 10)
    }
}

impl From<&PollingConfig> for PollBackoff {
    fn from(config: &PollingConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}
