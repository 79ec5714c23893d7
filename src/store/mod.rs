//! Document store abstraction for check-in records.
//!
//! A store holds JSON documents keyed by place identifier inside one
//! collection. Writes are merge-upserts: listed fields are overwritten,
//! increments are applied atomically against the stored value, and every
//! other field is left untouched. The document is created on first write.
//!
//! | Backend          | Use                                          |
//! |------------------|----------------------------------------------|
//! | `MemoryStore`    | tests, throwaway sessions                    |
//! | `SqliteStore`    | local file-backed persistence                |
//! | `FirestoreStore` | Cloud Firestore over its REST API            |

pub mod firestore;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::StoreError;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored document: a JSON object of fields.
pub type Document = Map<String, Value>;

/// Path to a (possibly nested) document field, e.g. `tagCounts` → `Loud`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(field: impl Into<String>) -> Self {
        Self(vec![field.into()])
    }

    pub fn nested(parent: impl Into<String>, key: impl Into<String>) -> Self {
        Self(vec![parent.into(), key.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// One merge-upsert against a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentWrite {
    /// Top-level fields replaced wholesale.
    pub set: Document,
    /// Server-side increments, applied after `set`.
    pub increments: Vec<(FieldPath, i64)>,
}

impl DocumentWrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    pub fn increment(mut self, path: FieldPath, by: i64) -> Self {
        self.increments.push((path, by));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.increments.is_empty()
    }
}

/// The persistence boundary for check-in records.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Read a document; `Ok(None)` when it has never been written.
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Merge-upsert a document, creating it if missing.
    async fn merge_upsert(&self, key: &str, write: DocumentWrite) -> Result<(), StoreError>;

    /// Atomically add `by` to a numeric field.
    async fn increment(&self, key: &str, path: FieldPath, by: i64) -> Result<(), StoreError> {
        self.merge_upsert(key, DocumentWrite::new().increment(path, by))
            .await
    }

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Reject keys no backend can address.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let reason = if key.is_empty() {
        "must not be empty"
    } else if key.contains('/') {
        "must not contain '/'"
    } else if key == "." || key == ".." {
        "must not be '.' or '..'"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

/// Apply a merge write to an in-memory document.
///
/// Increments follow Firestore semantics: a missing or non-integer target is
/// replaced by the increment value, intermediate maps are created as needed.
pub fn apply_write(doc: &mut Document, write: &DocumentWrite) {
    for (field, value) in &write.set {
        doc.insert(field.clone(), value.clone());
    }
    for (path, by) in &write.increments {
        apply_increment(doc, path.segments(), *by);
    }
}

fn apply_increment(doc: &mut Document, segments: &[String], by: i64) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut target = doc;
    for segment in parents {
        let entry = target
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        target = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    let next = match target.get(last).and_then(Value::as_i64) {
        Some(current) => current.saturating_add(by),
        None => by,
    };
    target.insert(last.clone(), Value::from(next));
}
