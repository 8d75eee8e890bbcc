//! In-memory document store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{
    Document, DocumentStore, Filter, FindOptions, StoreError, StoreResult, Update, UpdateOutcome,
    document_id,
};

/// Collections held in insertion order behind a single lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let id = document_id(&document)?;
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| document_id(d).is_ok_and(|existing| existing == id)) {
            return Err(StoreError::Duplicate(id));
        }
        docs.push(document);
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let matched: Vec<Document> = self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        Ok(options.apply(matched))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write();
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)))
        else {
            return Ok(UpdateOutcome::default());
        };

        let modified = update.apply_to(doc);
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }
}
