//! redb-backed document store
//!
//! # Tables
//!
//! One table per collection: key = `_id`, value = JSON-serialized document.
//!
//! # Durability
//!
//! Every insert/update is its own write transaction, so a single document
//! write is atomic and persistent once `commit()` returns. Finds scan the
//! collection table inside a read transaction (a consistent snapshot).

use async_trait::async_trait;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
};
use std::path::Path;
use std::sync::Arc;

use super::{
    Document, DocumentStore, Filter, FindOptions, StoreError, StoreResult, Update, UpdateOutcome,
    document_id,
};

fn table(collection: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(collection)
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Document store backed by a single redb file
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at `path`, creating the given collections
    pub fn open(path: impl AsRef<Path>, collections: &[&str]) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, collections)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(collections: &[&str]) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, collections)
    }

    fn init(db: Database, collections: &[&str]) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        for collection in collections {
            let _ = write_txn.open_table(table(collection))?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        match read_txn.open_table(table(collection)) {
            Ok(t) => Ok(t.len()?),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    fn backend_name(&self) -> &'static str {
        "redb"
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let id = document_id(&document)?;
        let bytes = serde_json::to_vec(&document)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table(collection))?;
            if t.get(id.as_str())?.is_some() {
                return Err(StoreError::Duplicate(id));
            }
            t.insert(id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let t = match read_txn.open_table(table(collection)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut matched = Vec::new();
        for entry in t.iter()? {
            let (_, value) = entry?;
            let doc: Document = serde_json::from_slice(value.value())?;
            if filter.matches(&doc) {
                matched.push(doc);
            }
        }
        Ok(options.apply(matched))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut t = write_txn.open_table(table(collection))?;

            let mut target: Option<(String, Document)> = None;
            for entry in t.iter()? {
                let (key, value) = entry?;
                let doc: Document = serde_json::from_slice(value.value())?;
                if filter.matches(&doc) {
                    target = Some((key.value().to_string(), doc));
                    break;
                }
            }

            match target {
                None => UpdateOutcome::default(),
                Some((key, mut doc)) => {
                    let modified = update.apply_to(&mut doc);
                    if modified {
                        let bytes = serde_json::to_vec(&doc)?;
                        t.insert(key.as_str(), bytes.as_slice())?;
                    }
                    UpdateOutcome {
                        matched: 1,
                        modified: u64::from(modified),
                    }
                }
            }
        };

        if outcome.modified > 0 {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }

    async fn ping(&self) -> StoreResult<()> {
        let _ = self.db.begin_read()?;
        Ok(())
    }
}
