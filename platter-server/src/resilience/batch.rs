use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;

use super::{ResilientAccess, Transient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub size: usize,
    pub delay_between: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: 5,
            delay_between: Duration::from_millis(200),
        }
    }
}

impl ResilientAccess {
    /// Process `items` in batches using the configured batch size and pacing
    pub async fn batch_process<I, F, Fut, T, E>(&self, items: Vec<I>, operation: F) -> Result<Vec<T>, E>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let BatchConfig {
            size,
            delay_between,
        } = self.batch;
        self.batch_process_with(items, operation, size, delay_between)
            .await
    }

    /// Partition `items` into batches of `batch_size`; each batch runs concurrently,
    /// every operation wrapped in the retry policy, with `delay_between` between batches.
    ///
    /// The first failing batch aborts the whole run. Results keep input order.
    pub async fn batch_process_with<I, F, Fut, T, E>(
        &self,
        items: Vec<I>,
        operation: F,
        batch_size: usize,
        delay_between: Duration,
    ) -> Result<Vec<T>, E>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let batch_size = batch_size.max(1);
        let total_batches = items.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(items.len());

        for (index, chunk) in items.chunks(batch_size).enumerate() {
            let operation = &operation;
            let pending = chunk.iter().cloned().map(|item| {
                self.execute(move || operation(item.clone()))
            });

            let batch = try_join_all(pending).await.map_err(|e| {
                tracing::error!(
                    batch = index + 1,
                    total_batches,
                    error = %e,
                    "Batch failed, aborting remaining batches"
                );
                e
            })?;
            results.extend(batch);

            if index + 1 < total_batches {
                tracing::debug!(
                    batch = index + 1,
                    total_batches,
                    delay_ms = delay_between.as_millis() as u64,
                    "Batch complete"
                );
                self.throttle_for(delay_between).await;
            }
        }

        Ok(results)
    }
}
