//! Database Module
//!
//! Document-store abstraction consumed by the order repository.
//!
//! | Backend | Type | Use |
//! |---------|------|-----|
//! | redb | [`RedbStore`] | durable single-file store (default) |
//! | memory | [`MemoryStore`] | tests, demos |
//!
//! Documents are JSON objects keyed by [`ID_FIELD`]. Single-document writes are
//! atomic; there are no multi-document transactions.

#[cfg(test)]
pub mod flaky;
pub mod memory;
pub mod query;
pub mod redb_store;

pub use memory::MemoryStore;
pub use query::{
    AggregateOutput, Aggregation, Condition, Filter, FindOptions, Sort, Update, UpdateOutcome,
};
pub use redb_store::RedbStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::resilience::{Transient, matches_transient_signature};

/// Primary key field of every document
pub const ID_FIELD: &str = "_id";

/// A stored document (JSON object)
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rate limit, connection limit or timeout reported by the store
    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        match self {
            StoreError::Transient(_) => true,
            // Backend errors carry the driver's message; classify by signature
            StoreError::Backend(message) => matches_transient_signature(message),
            _ => false,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for health output
    fn backend_name(&self) -> &'static str;

    /// Insert a new document; fails with [`StoreError::Duplicate`] on an existing `_id`
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let docs = self
            .find(collection, filter, &FindOptions::new().limit(1))
            .await?;
        Ok(docs.into_iter().next())
    }

    /// Apply `update` to the first document matching `filter`
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome>;

    /// Snapshot aggregate over the matching documents (not isolated from concurrent writes)
    async fn aggregate(
        &self,
        collection: &str,
        filter: &Filter,
        aggregation: &Aggregation,
    ) -> StoreResult<AggregateOutput> {
        let docs = self.find(collection, filter, &FindOptions::new()).await?;
        Ok(aggregation.fold(docs.iter()))
    }

    /// Cheap liveness probe
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Extract the `_id` of a document being inserted
pub(crate) fn document_id(document: &Document) -> StoreResult<String> {
    document
        .get(ID_FIELD)
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidDocument(format!("missing string {ID_FIELD}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::Transient("busy".into()).is_transient());
        assert!(StoreError::Backend("Rate limit exceeded, retry later".into()).is_transient());
        assert!(!StoreError::Backend("corrupted page".into()).is_transient());
        assert!(!StoreError::Duplicate("o1".into()).is_transient());
    }
}
