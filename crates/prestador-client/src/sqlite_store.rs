//! SQLite-backed [`RecordStore`].
//!
//! One row per document path, body stored as JSON text. Merge-writes read the
//! current body, overlay the new fields and write it back inside a single
//! transaction. rusqlite is blocking, so every call hops onto
//! `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prestador_types::{Document, DocumentPath};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;

use crate::store::{RecordStore, StoreError, merge_into};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    path TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at INTEGER DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
"#;

/// Thread-safe connection handle.
type DbHandle = Arc<Mutex<Connection>>;

pub struct SqliteStore {
    conn: DbHandle,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store worker failed: {e}")))?
    }
}

fn read_body(conn: &Connection, key: &str) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row("SELECT body FROM documents WHERE path = ?1", params![key], |row| row.get(0))
        .optional()?;

    match body {
        None => Ok(None),
        Some(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(StoreError::Malformed {
                path: key.to_string(),
                reason: "body is not an object".into(),
            }),
            Err(e) => Err(StoreError::Malformed {
                path: key.to_string(),
                reason: e.to_string(),
            }),
        },
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let key = path.to_string();
        self.with_conn(move |conn| read_body(conn, &key)).await
    }

    async fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), StoreError> {
        let key = path.to_string();
        let owner = path.owner_id.to_string();
        debug!("sqlite merge {key} ({} fields)", fields.len());

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut body = read_body(&tx, &key)?.unwrap_or_default();
            merge_into(&mut body, fields);
            let text = Value::Object(body).to_string();
            tx.execute(
                "INSERT INTO documents (path, owner_id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(path) DO UPDATE SET body = excluded.body, updated_at = unixepoch()",
                params![key, owner, text],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let key = path.to_string();
        debug!("sqlite delete {key}");
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM documents WHERE path = ?1", params![key])?;
            Ok(())
        })
        .await
    }
}
