//! Retry a single fallible operation a bounded number of times with a fixed delay.
//!
//! The [`RetryPolicy`] knows nothing about what it retries: callers wrap the side effect
//! they want to harden in a closure returning a future and the policy handles the
//! control flow around it.
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use provisioner_context::Context;

/// All attempts to perform an operation failed.
#[derive(Debug, thiserror::Error)]
#[error("operation failed after {0} attempts")]
pub struct RetriesExhausted(pub u16);

/// Retry a fallible operation up to a maximum number of attempts with a fixed delay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    attempts: u16,
    delay: Duration,
}

impl RetryPolicy {
    /// Initialise a retry policy.
    ///
    /// Policies always make at least one attempt, even if `attempts` is 0.
    pub fn new(attempts: u16, delay: Duration) -> RetryPolicy {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Maximum number of times the operation is invoked.
    pub fn attempts(&self) -> u16 {
        self.attempts
    }

    /// Fixed delay between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Invoke the operation until it succeeds or the maximum attempts are made.
    ///
    /// The policy sleeps for the configured delay after every failed attempt except the last.
    ///
    /// # Errors
    ///
    /// When all attempts fail the error from the last attempt is returned,
    /// with a [`RetriesExhausted`] context attached to it.
    pub async fn retry<F, Fut, T>(&self, context: &Context, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if attempt >= self.attempts {
                return Err(error.context(RetriesExhausted(self.attempts)));
            }

            slog::warn!(
                context.logger, "Attempt to perform operation failed, will retry";
                "attempt" => attempt,
                "attempts" => self.attempts,
                replisdk::utils::error::slog::ErrorAttributes::from(&error),
            );
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

impl From<&RetryConf> for RetryPolicy {
    fn from(value: &RetryConf) -> Self {
        RetryPolicy::new(value.attempts, Duration::from_secs(value.delay))
    }
}

/// Serialisable configuration of a [`RetryPolicy`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RetryConf {
    /// Maximum number of attempts to make.
    #[serde(default = "RetryConf::default_attempts")]
    pub attempts: u16,

    /// Delay, in seconds, between attempts.
    #[serde(default = "RetryConf::default_delay")]
    pub delay: u64,
}

impl Default for RetryConf {
    fn default() -> Self {
        RetryConf {
            attempts: RetryConf::default_attempts(),
            delay: RetryConf::default_delay(),
        }
    }
}

impl RetryConf {
    fn default_attempts() -> u16 {
        3
    }

    fn default_delay() -> u64 {
        5
    }
}
