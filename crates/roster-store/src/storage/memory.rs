//! In-memory collection storage.

use std::{
    collections::HashMap,
    sync::{
        RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use roster_core::{Collection, RecordStore, StoreError};

/// In-memory storage implementation.
///
/// Collections are kept as serialized JSON text, exactly as a file would
/// hold them, so corrupt content can be seeded for tests.
/// Data is lost on restart.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Replace a collection's content.
    ///
    /// # Errors
    /// Returns error if the collection cannot be encoded.
    pub fn seed(&self, collection: &str, records: &Collection) -> Result<(), StoreError> {
        let text = serde_json::to_string(records).map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            source,
        })?;
        self.seed_raw(collection, text)
    }

    /// Replace a collection's content with arbitrary text.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn seed_raw(&self, collection: &str, text: impl Into<String>) -> Result<(), StoreError> {
        self.collections
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?
            .insert(collection.to_string(), text.into());
        Ok(())
    }

    /// Raw stored text of a collection.
    #[must_use]
    pub fn raw(&self, collection: &str) -> Option<String> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).cloned())
    }

    /// Make every subsequent save fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, collection: &str) -> Result<Collection, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        let text = collections.get(collection).ok_or_else(|| StoreError::Io {
            collection: collection.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "collection never written"),
        })?;

        serde_json::from_str(text).map_err(|source| StoreError::Corrupt {
            collection: collection.to_string(),
            source,
        })
    }

    async fn save(&self, collection: &str, records: &Collection) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Internal(format!(
                "saves to {collection} are disabled"
            )));
        }
        self.seed(collection, records)
    }
}
