use async_trait::async_trait;
use std::time::Duration;

/// When and how long to wait before re-issuing a failed request.
///
/// # Default Values
/// - `max_retries`: 3
/// - `base_delay`: 1 second
/// - `retryable_statuses`: `[503]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. A call makes at most
    /// `max_retries + 1` requests.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on every subsequent retry.
    pub base_delay: Duration,
    /// Statuses considered transient.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            retryable_statuses: vec![503],
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_retryable(&self, status: reqwest::StatusCode) -> bool {
        self.retryable_statuses.contains(&status.as_u16())
    }

    /// Whether a request that failed with `status` after `retry_count`
    /// retries should be attempted again.
    #[must_use]
    pub fn should_retry(&self, status: reqwest::StatusCode, retry_count: u32) -> bool {
        self.is_retryable(status) && retry_count < self.max_retries
    }

    /// `base_delay * 2^retry_count`
    #[must_use]
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

/// Waits between attempts. Injected so tests can observe the backoff
/// without real time passing.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
