//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(collection, id)` | JSON object bytes | All documents |
//!
//! Documents of one collection are contiguous in key order, so a collection
//! scan is a range read from `(collection, "")` that stops at the first key
//! of another collection.
//!
//! # Atomicity
//!
//! Every write runs inside one redb write transaction. [`DocumentStore::transaction`]
//! exposes that span to callers: the closure's writes commit together or not
//! at all. Change events are broadcast only after a successful commit.

mod collection;
pub mod query;
pub mod subscription;

pub use collection::Collection;
pub use query::{Direction, Filter, FilterOp, Query};
pub use subscription::{ChangeEvent, ChangeKind, LiveQuery, Subscription};

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;
use tokio::sync::broadcast;

/// All documents: key = (collection, id), value = JSON-serialized object
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document {collection}/{id} is not a JSON object")]
    NotAnObject { collection: String, id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Map a redb failure to an error code by message
fn classify_engine_error(err: &StoreError) -> ErrorCode {
    let msg = err.to_string().to_lowercase();
    if msg.contains("no space") || msg.contains("disk full") || msg.contains("enospc") {
        return ErrorCode::StorageFull;
    }
    if msg.contains("corrupt") || msg.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }
    if msg.contains("already open") {
        return ErrorCode::SystemBusy;
    }
    ErrorCode::DatabaseError
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { collection, id } => {
                AppError::with_message(ErrorCode::NotFound, err.to_string())
                    .with_detail("collection", collection.as_str())
                    .with_detail("id", id.as_str())
            }
            StoreError::NotAnObject { .. } | StoreError::Serialization(_) => {
                AppError::with_message(ErrorCode::InvalidFormat, err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Document store failure");
                AppError::with_message(classify_engine_error(&err), err.to_string())
            }
        }
    }
}

/// One stored document with its store id
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }

    /// Field by dotted path; `null` counts as absent
    pub fn field(&self, path: &str) -> Option<&Value> {
        query::lookup(&self.data, path)
    }

    /// Deserialize, injecting the store id as `id`
    pub fn into_typed<T: DeserializeOwned>(self) -> StoreResult<T> {
        let mut data = self.data;
        if let Value::Object(map) = &mut data {
            map.insert("id".into(), Value::String(self.id));
        }
        Ok(serde_json::from_value(data)?)
    }
}

/// Serialize a value into a storable object, dropping its `id` field
pub(crate) fn to_document<T: Serialize>(value: &T) -> StoreResult<Value> {
    let mut data = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut data {
        map.remove("id");
    }
    Ok(data)
}

/// Collection-oriented JSON document store
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
    events: broadcast::Sender<ChangeEvent>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl DocumentStore {
    /// Open or create the store at the given path
    ///
    /// redb commits are durable once `commit()` returns.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_capacity(path, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn open_with_capacity(path: impl AsRef<Path>, capacity: usize) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, capacity)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, DEFAULT_CHANNEL_CAPACITY)
    }

    fn init(db: Database, capacity: usize) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;

        let (events, _) = broadcast::channel(capacity.max(1));
        Ok(Self {
            db: Arc::new(db),
            events,
        })
    }

    // ========== Reads ==========

    pub fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((collection, id))? {
            Some(guard) => Ok(Some(Document::new(id, serde_json::from_slice(guard.value())?))),
            None => Ok(None),
        }
    }

    /// Every document of a collection, in id order
    pub fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        scan(&table, collection)
    }

    pub fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        Ok(query.apply(self.get_all(collection)?))
    }

    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.get_all(collection)?.len())
    }

    // ========== Single-document writes ==========

    /// Insert under a fresh store-assigned id
    pub fn create(&self, collection: &str, doc: Value) -> StoreResult<String> {
        self.transaction(|txn| txn.create(collection, doc))
    }

    /// Create or replace under a known id
    pub fn set(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.transaction(|txn| txn.set(collection, id, doc))
    }

    /// Shallow merge; fails with `NotFound` if the document is absent
    pub fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        self.transaction(|txn| txn.update(collection, id, patch))
    }

    /// Remove a document; `false` if it did not exist
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.transaction(|txn| txn.delete(collection, id))
    }

    // ========== Transactions ==========

    /// Run `f` inside one atomic write transaction
    ///
    /// Commits when `f` returns `Ok`, aborts when it returns `Err`. Nothing
    /// written inside an aborted transaction is visible afterwards.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StoreTxn) -> Result<T, E>,
        E: From<StoreError>,
    {
        let write_txn = self.db.begin_write().map_err(StoreError::from)?;
        let mut txn = StoreTxn {
            txn: write_txn,
            changes: Vec::new(),
        };

        match f(&mut txn) {
            Ok(value) => {
                let StoreTxn { txn, changes } = txn;
                txn.commit().map_err(StoreError::from)?;
                for change in changes {
                    // No receivers is fine
                    let _ = self.events.send(change);
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.txn.abort() {
                    tracing::warn!(error = %abort_err, "Transaction abort failed");
                }
                Err(err)
            }
        }
    }

    // ========== Subscriptions ==========

    pub fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, self.events.subscribe())
    }

    pub fn live_query(&self, collection: &str, query: Query) -> LiveQuery {
        LiveQuery::new(self.clone(), collection, query)
    }

    /// Typed view over one collection
    pub fn collection<T: Serialize + DeserializeOwned>(&self, name: &'static str) -> Collection<T> {
        Collection::new(self.clone(), name)
    }
}

fn scan(
    table: &impl ReadableTable<(&'static str, &'static str), &'static [u8]>,
    collection: &str,
) -> StoreResult<Vec<Document>> {
    let mut docs = Vec::new();
    for result in table.range((collection, "")..)? {
        let (key, value) = result?;
        let (coll, id) = key.value();
        if coll != collection {
            break;
        }
        docs.push(Document::new(id, serde_json::from_slice(value.value())?));
    }
    Ok(docs)
}

/// Write access inside [`DocumentStore::transaction`]
///
/// Reads see the transaction's own uncommitted writes.
pub struct StoreTxn {
    txn: WriteTransaction,
    changes: Vec<ChangeEvent>,
}

impl StoreTxn {
    pub fn get(&mut self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let table = self.txn.open_table(DOCUMENTS_TABLE)?;
        let found = match table.get((collection, id))? {
            Some(guard) => Some(Document::new(id, serde_json::from_slice(guard.value())?)),
            None => None,
        };
        Ok(found)
    }

    /// Like [`get`](Self::get) but absent documents are an error
    pub fn require(&mut self, collection: &str, id: &str) -> StoreResult<Document> {
        self.get(collection, id)?.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub fn get_all(&mut self, collection: &str) -> StoreResult<Vec<Document>> {
        let table = self.txn.open_table(DOCUMENTS_TABLE)?;
        scan(&table, collection)
    }

    pub fn create(&mut self, collection: &str, doc: Value) -> StoreResult<String> {
        let id = shared::util::document_id();
        self.write(collection, &id, &doc, ChangeKind::Created)?;
        Ok(id)
    }

    pub fn set(&mut self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        let kind = if self.get(collection, id)?.is_some() {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        self.write(collection, id, &doc, kind)
    }

    pub fn update(&mut self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        let current = self.require(collection, id)?;
        let merged = merge(collection, current, patch)?;
        self.write(collection, id, &merged, ChangeKind::Updated)
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut table = self.txn.open_table(DOCUMENTS_TABLE)?;
        let existed = table.remove((collection, id))?.is_some();
        drop(table);
        if existed {
            self.changes.push(ChangeEvent::new(collection, id, ChangeKind::Deleted));
        }
        Ok(existed)
    }

    fn write(&mut self, collection: &str, id: &str, doc: &Value, kind: ChangeKind) -> StoreResult<()> {
        if !doc.is_object() {
            return Err(StoreError::NotAnObject {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let bytes = serde_json::to_vec(doc)?;
        let mut table = self.txn.open_table(DOCUMENTS_TABLE)?;
        table.insert((collection, id), bytes.as_slice())?;
        drop(table);
        self.changes.push(ChangeEvent::new(collection, id, kind));
        Ok(())
    }
}

/// Shallow merge: top-level keys of `patch` replace those of the document
fn merge(collection: &str, current: Document, patch: Value) -> StoreResult<Value> {
    let (Value::Object(mut base), Value::Object(patch)) = (current.data, patch) else {
        return Err(StoreError::NotAnObject {
            collection: collection.to_string(),
            id: current.id,
        });
    };
    for (key, value) in patch {
        if key != "id" {
            base.insert(key, value);
        }
    }
    Ok(Value::Object(base))
}
