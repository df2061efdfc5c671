//! Retry policy for Calendar API requests.
//!
//! Throttling and server errors are retried with exponential backoff. A
//! `Retry-After` header from the API takes precedence, within the same cap.

use std::time::Duration;

use lectio_core::StoreError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        RetryPolicy {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay before retry `attempt`, preferring the server's hint when given.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|hint| hint.min(self.max_backoff))
            .unwrap_or_else(|| self.backoff(attempt))
    }

    pub fn should_retry(&self, error: &StoreError, attempt: u32) -> bool {
        attempt <= self.max_retries && is_transient(error)
    }
}

pub fn is_transient(error: &StoreError) -> bool {
    match error {
        StoreError::RateLimited | StoreError::Transport(_) => true,
        StoreError::Http { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Parses a `Retry-After` header given in seconds. HTTP dates are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
        assert_eq!(policy.backoff(6), Duration::from_secs(8));
        assert_eq!(policy.backoff(40), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_after_wins_but_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1, Some(Duration::from_secs(3))), Duration::from_secs(3));
        assert_eq!(policy.delay(1, Some(Duration::from_secs(120))), Duration::from_secs(8));
        assert_eq!(policy.delay(2, None), Duration::from_secs(1));
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        let policy = RetryPolicy::default();
        let unavailable = StoreError::Http {
            status: 503,
            message: String::new(),
        };
        let bad_request = StoreError::Http {
            status: 400,
            message: String::new(),
        };

        assert!(policy.should_retry(&StoreError::RateLimited, 1));
        assert!(policy.should_retry(&unavailable, 3));
        assert!(!policy.should_retry(&unavailable, 4));
        assert!(!policy.should_retry(&bad_request, 1));
        assert!(!policy.should_retry(&StoreError::NotFound("lec1".into()), 1));
        assert!(!RetryPolicy::disabled().should_retry(&StoreError::RateLimited, 1));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
