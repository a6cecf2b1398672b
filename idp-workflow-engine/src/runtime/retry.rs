//! Activity retry policy.

use std::time::Duration;

/// Retry behavior applied to every activity unless overridden: exponential
/// backoff from 5 s doubling up to a 1 min cap, at most 5 attempts, each
/// attempt bounded by a 5 min start-to-close timeout.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_interval: Duration,
    pub maximum_attempts: u32,
    pub start_to_close_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(60),
            maximum_attempts: 5,
            start_to_close_timeout: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep after the given 1-based attempt fails.
    pub fn backoff_interval(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let interval =
            self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        Duration::from_secs_f64(interval.min(self.maximum_interval.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_interval(1), Duration::from_secs(5));
        assert_eq!(policy.backoff_interval(2), Duration::from_secs(10));
        assert_eq!(policy.backoff_interval(3), Duration::from_secs(20));
        assert_eq!(policy.backoff_interval(4), Duration::from_secs(40));
        // Capped at the maximum interval from the fifth attempt on.
        assert_eq!(policy.backoff_interval(5), Duration::from_secs(60));
        assert_eq!(policy.backoff_interval(30), Duration::from_secs(60));
    }
}
