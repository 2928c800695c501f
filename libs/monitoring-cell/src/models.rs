// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use std::time::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(&self) -> bool {
        matches!(self, Connectivity::Online)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same interval whatever the outcome.
    Fixed,
    /// Interval doubles per consecutive failure, capped at `max`.
    Exponential { max: Duration },
}

/// How often a background poll runs and how it slows down while failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff: Backoff,
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval, backoff: Backoff::Fixed }
    }

    pub fn exponential(interval: Duration, max: Duration) -> Self {
        Self { interval, backoff: Backoff::Exponential { max } }
    }

    pub fn next_delay(&self, consecutive_failures: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => {
                let factor = 2u32.checked_pow(consecutive_failures.min(31)).unwrap_or(u32::MAX);
                self.interval.checked_mul(factor).unwrap_or(max).min(max)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_ignores_failures() {
        let policy = PollPolicy::fixed(Duration::from_secs(10));
        assert_eq!(policy.next_delay(0), Duration::from_secs(10));
        assert_eq!(policy.next_delay(7), Duration::from_secs(10));
    }

    #[test]
    fn exponential_policy_doubles_up_to_cap() {
        let policy = PollPolicy::exponential(Duration::from_secs(10), Duration::from_secs(60));
        assert_eq!(policy.next_delay(0), Duration::from_secs(10));
        assert_eq!(policy.next_delay(1), Duration::from_secs(20));
        assert_eq!(policy.next_delay(2), Duration::from_secs(40));
        assert_eq!(policy.next_delay(3), Duration::from_secs(60));
        assert_eq!(policy.next_delay(40), Duration::from_secs(60));
    }
}
