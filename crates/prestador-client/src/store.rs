//! Per-user document store.
//!
//! Records are addressed by [`DocumentPath`] (`users/{owner}/services/{id}`).
//! Writes are merge-writes: fields in the payload overwrite, fields absent
//! from it are left as they are. There is no concurrency token, so two
//! writers to the same document race with last-write-wins per field.
//!
//! Two backends ship with the crate: [`MemoryStore`] (ephemeral, tests and
//! scratch sessions) and [`SqliteStore`](crate::SqliteStore).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use prestador_types::{Document, DocumentPath};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors from a store round trip.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or its worker went away.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The SQLite backend failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// A stored body is not a JSON object.
    #[error("malformed document at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Asynchronous document store. Every operation may fail.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a document. `Ok(None)` when nothing is stored at `path`.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Merge `fields` into the document at `path`, creating it if needed.
    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError>;

    /// Delete the document at `path`. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;
}

/// Store handle shared by every screen.
pub type SharedRecordStore = Arc<dyn RecordStore>;

/// Overlay `fields` onto `existing`, field by field.
pub(crate) fn merge_into(existing: &mut Document, fields: Document) {
    for (key, value) in fields {
        existing.insert(key, value);
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store keyed by the rendered document path.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Store a raw document as-is, bypassing merge semantics.
    ///
    /// Used to seed data, including malformed documents.
    pub fn insert_raw(&self, path: &DocumentPath, doc: Document) {
        self.documents.insert(path.to_string(), doc);
    }

    /// Synchronous read of a stored document.
    pub fn snapshot(&self, path: &DocumentPath) -> Option<Document> {
        self.documents.get(&path.to_string()).map(|d| d.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        trace!("memory get {path}");
        Ok(self.snapshot(path))
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        debug!("memory merge {path} ({} fields)", fields.len());
        let mut entry = self.documents.entry(path.to_string()).or_default();
        merge_into(entry.value_mut(), fields);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        debug!("memory delete {path}");
        self.documents.remove(&path.to_string());
        Ok(())
    }
}

/// Create a new shared in-memory store.
pub fn shared_memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}
