use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use super::sleeper::Sleeper;

// ============================================================================
// Exponential Backoff Retry
// ============================================================================
//
// Transient failures (rate limits, connection limits, timeouts) are retried
// with `base_delay * 2^attempt` between attempts. Anything else propagates on
// the first failure.
//
// ============================================================================

/// Lower-cased fragments that mark a store error as worth retrying
const TRANSIENT_SIGNATURES: &[&str] = &[
    "rate limit",
    "too many requests",
    "429",
    "connection limit",
    "too many connections",
    "connection reset",
    "connection refused",
    "econnreset",
    "timed out",
    "timeout",
    "etimedout",
    "temporarily unavailable",
    "system busy",
];

/// Classifies an error as transient (retry) or permanent (propagate)
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Whether a raw error message carries a transient signature
pub fn matches_transient_signature(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles for every further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget is spent
///
/// Once started the sequence runs to completion; there is no overall deadline.
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if !error.is_transient() {
                    tracing::error!(error = %error, "Permanent failure detected, not retrying");
                    return Err(error);
                }

                if attempt >= policy.max_retries {
                    tracing::error!(
                        attempt = attempt + 1,
                        error = %error,
                        "Operation failed after all retries"
                    );
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying after delay"
                );

                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
