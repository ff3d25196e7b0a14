//! Retry policy with linear backoff.

use std::time::Duration;

/// Backoff strategy between failed attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay after every failure.
    Fixed {
        delay: Duration,
    },
    /// Sleeps `attempt * step` after the given 1-based attempt fails.
    Linear {
        step: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            step: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Delay to wait after the 1-based `attempt` failed.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Linear { step } => step.saturating_mul(attempt),
        }
    }
}

/// Configuration for the fetcher's retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Statuses below 500 that are still worth retrying.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429],
        }
    }
}

impl RetryConfig {
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear { step },
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// Every 5xx plus the configured extra statuses.
    pub fn should_retry_status(&self, status: u16) -> bool {
        (500..600).contains(&status) || self.retry_on_status.contains(&status)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_backoff_grows_by_step() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::from_secs(2));
        assert_eq!(backoff.delay(4), Duration::from_secs(4));
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let config = RetryConfig::fixed(Duration::from_millis(50), 3);

        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(50));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(50));
    }

    #[test]
    fn default_retry_config() {
        let config = RetryConfig::default();

        assert_eq!(config.max_attempts, 5);
        assert!(config.should_retry_status(500));
        assert!(config.should_retry_status(503));
        assert!(config.should_retry_status(599));
        assert!(config.should_retry_status(408));
        assert!(config.should_retry_status(429));
        assert!(!config.should_retry_status(403));
        assert!(!config.should_retry_status(404));
    }
}
