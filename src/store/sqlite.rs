use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::{CheckInStore, Document, DocumentWrite, apply_write, validate_key};
use crate::errors::StoreError;

/// Local document store on SQLite.
///
/// Documents are stored as JSON text, one row per `(collection, id)`. All
/// access runs on tokio's blocking pool; each merge-upsert is one
/// `IMMEDIATE` transaction, so read-modify-write increments from several
/// connections to the same file serialize instead of losing updates.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl SqliteStore {
    /// Open (or create) a database file and run migrations.
    pub fn open(path: &Path, collection: &str) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        Self::with_connection(conn, collection)
    }

    /// In-memory database (for testing).
    pub fn open_in_memory(collection: &str) -> anyhow::Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> anyhow::Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (collection, id)
            );
            ",
        )
        .context("Failed to create documents table")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Run a closure against the connection on a blocking thread.
    async fn call<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Other(anyhow!("SQLite task panicked: {e}")))?
    }
}

fn read_document(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Database(e.into()))?;

    body.map(|text| {
        serde_json::from_str::<Document>(&text)
            .map_err(|e| StoreError::Malformed(format!("{collection}/{id}: {e}")))
    })
    .transpose()
}

#[async_trait]
impl CheckInStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        validate_key(key)?;
        let collection = self.collection.clone();
        let id = key.to_string();
        self.call(move |conn| read_document(conn, &collection, &id))
            .await
    }

    async fn merge_upsert(&self, key: &str, write: DocumentWrite) -> Result<(), StoreError> {
        validate_key(key)?;
        let collection = self.collection.clone();
        let id = key.to_string();
        self.call(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| StoreError::Database(e.into()))?;

            let mut doc = read_document(&tx, &collection, &id)?.unwrap_or_default();
            apply_write(&mut doc, &write);
            let body = serde_json::to_string(&doc)
                .map_err(|e| StoreError::Other(anyhow!("Failed to encode document: {e}")))?;

            tx.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(collection, id)
                 DO UPDATE SET body = excluded.body, updated_at = datetime('now')",
                params![collection, id, body],
            )
            .map_err(|e| StoreError::Database(e.into()))?;
            tx.commit().map_err(|e| StoreError::Database(e.into()))?;
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
