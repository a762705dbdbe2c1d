//! Retry policy for transient network failures
//!
//! Only connection failures and timeouts are retried. A missing resource
//! (HTTP error status, redirect to the home page) fails on the first attempt.
//!
//! The default policy retries forever with a fixed 5 second backoff: a flaky
//! connection should not leave gaps in the catalog. Cancellation interrupts the
//! loop at the backoff sleep. Set `max_attempts` to cap the loop.

use crate::config::RetryConfig;
use crate::CatalogError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Backoff used when nothing else is configured
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// How often and how patiently a failed request is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed delay between attempts
    pub backoff: Duration,

    /// Total attempts allowed, `None` for unbounded
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_BACKOFF)
    }
}

impl RetryPolicy {
    /// Retries until success or cancellation
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    /// Gives up after `max_attempts` attempts
    pub fn bounded(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            backoff: Duration::from_secs(config.backoff_secs),
            max_attempts: config.max_attempts,
        }
    }

    /// Returns true if another attempt is allowed after `attempts` failures
    fn allows_retry(&self, attempts: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts < max,
            None => true,
        }
    }

    /// Runs `operation` until it succeeds or fails with a non-transient error
    ///
    /// # Arguments
    ///
    /// * `cancel` - Token checked before each attempt and raced against the backoff
    /// * `what` - Description of the operation for log messages
    /// * `operation` - Produces one attempt per call
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - An attempt succeeded
    /// * `Err(CatalogError::Cancelled)` - The token was cancelled
    /// * `Err(e)` - A non-transient error, or the last transient error once
    ///   `max_attempts` is exhausted
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        what: &str,
        mut operation: F,
    ) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(CatalogError::Cancelled);
            }

            attempts += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            if !self.allows_retry(attempts) {
                tracing::error!("Giving up on {} after {} attempts: {}", what, attempts, error);
                return Err(error);
            }

            tracing::warn!(
                "Attempt {} for {} failed: {}; retrying in {:?}",
                attempts,
                what,
                error,
                self.backoff
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }
    }
}
