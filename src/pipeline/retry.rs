//! pipeline::retry
//!
//! Bounded exponential backoff for retryable store failures.

use std::time::Duration;

/// How often and how patiently to repeat a retryable store call.
///
/// Attempt `n` (zero-based) that fails retryably waits
/// `backoff_base_ms * 2^n` before attempt `n + 1`. At most `max_retries`
/// repeats follow the first attempt.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tabledit::pipeline::RetryPolicy;
///
/// let policy = RetryPolicy { max_retries: 3, backoff_base_ms: 100 };
/// assert_eq!(policy.delay_for(0), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(400));
/// assert!(policy.allows_retry(2));
/// assert!(!policy.allows_retry(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    /// Whether another attempt may follow the failed attempt `attempt`.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay after the failed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}
