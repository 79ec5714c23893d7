use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CheckInStore, Document, DocumentWrite, apply_write, validate_key};
use crate::errors::StoreError;

/// In-process store. Each write is applied under a single lock, so
/// concurrent increments are never lost.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CheckInStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        validate_key(key)?;
        let docs = self.docs.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(docs.get(key).cloned())
    }

    async fn merge_upsert(&self, key: &str, write: DocumentWrite) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut docs = self.docs.lock().map_err(|_| StoreError::LockPoisoned)?;
        let doc = docs.entry(key.to_string()).or_default();
        apply_write(doc, &write);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
