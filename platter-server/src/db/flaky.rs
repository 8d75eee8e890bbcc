//! Fault-injecting store wrapper for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{Document, DocumentStore, Filter, FindOptions, StoreError, StoreResult, Update, UpdateOutcome};

/// Fails the next `n` calls with a rate-limit error, then delegates
#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    failures_left: Mutex<u32>,
    calls: Mutex<u32>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            failures_left: Mutex::new(0),
            calls: Mutex::new(0),
        }
    }

    pub fn fail_next(&self, n: u32) {
        *self.failures_left.lock() = n;
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    fn gate(&self) -> StoreResult<()> {
        *self.calls.lock() += 1;
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(StoreError::Backend("Rate limit exceeded (429)".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        self.gate()?;
        self.inner.insert_one(collection, document).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        self.gate()?;
        self.inner.find(collection, filter, options).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome> {
        self.gate()?;
        self.inner.update_one(collection, filter, update).await
    }
}
