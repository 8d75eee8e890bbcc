//! Resilient access layer
//!
//! Wraps units of work against a rate-limited / flaky backing store:
//!
//! - [`ResilientAccess::execute`] - retry transient failures with exponential backoff
//! - [`ResilientAccess::throttle`] - cooperative delay before high-frequency writes
//! - [`ResilientAccess::batch_process`] - fixed-size concurrent batches with pacing
//!
//! Knows nothing about orders; any persistence-bound component can use it.

mod batch;
mod retry;
mod sleeper;

pub use batch::BatchConfig;
pub use retry::{RetryPolicy, Transient, execute_with_retry, matches_transient_signature};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default throttle delay
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct ResilientAccess {
    policy: RetryPolicy,
    throttle: Duration,
    batch: BatchConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for ResilientAccess {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), DEFAULT_THROTTLE, BatchConfig::default())
    }
}

impl ResilientAccess {
    pub fn new(policy: RetryPolicy, throttle: Duration, batch: BatchConfig) -> Self {
        Self {
            policy,
            throttle,
            batch,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the delay source (tests inject a [`RecordingSleeper`])
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn batch_config(&self) -> BatchConfig {
        self.batch
    }

    /// Run `operation` under the configured retry policy
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        execute_with_retry(self.policy, self.sleeper.as_ref(), operation).await
    }

    /// Run `operation` with an explicit retry budget
    pub async fn execute_with_retry<F, Fut, T, E>(
        &self,
        operation: F,
        max_retries: u32,
        base_delay: Duration,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let policy = RetryPolicy::new(max_retries, base_delay);
        execute_with_retry(policy, self.sleeper.as_ref(), operation).await
    }

    /// Pause for the configured throttle delay
    pub async fn throttle(&self) {
        self.throttle_for(self.throttle).await;
    }

    pub async fn throttle_for(&self, delay: Duration) {
        if !delay.is_zero() {
            self.sleeper.sleep(delay).await;
        }
    }
}
