//! Read-modify-write operations over whole collections.

use std::{collections::HashMap, sync::Arc};

use roster_core::{Collection, Record, RecordId, RecordStore, StoreError};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Collection service layered over a `RecordStore`.
///
/// Every mutation loads the full collection, changes it and saves it back.
/// Cycles on the same collection are serialized by a per-collection lock,
/// so concurrent sessions cannot overwrite each other's changes. Reads that
/// fail degrade to an empty collection.
pub struct CollectionService {
    store: Arc<dyn RecordStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionService {
    /// Create a new collection service.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock(&self, collection: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(collection.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    async fn load_or_empty(&self, collection: &str) -> Collection {
        match self.store.load(collection).await {
            Ok(records) => records,
            Err(e) if e.is_missing() => {
                tracing::warn!(collection, "Collection not found, treating as empty");
                Collection::new()
            }
            Err(e) => {
                tracing::warn!(collection, error = %e, "Failed to read collection, treating as empty");
                Collection::new()
            }
        }
    }

    /// Load ahead of a save. Unreadable content is replaced by the save.
    async fn load_for_write(&self, collection: &str) -> Collection {
        match self.store.load(collection).await {
            Ok(records) => records,
            Err(e) if e.is_missing() => Collection::new(),
            Err(e) => {
                tracing::error!(
                    collection,
                    error = %e,
                    "Unreadable collection will be overwritten, previous content is lost"
                );
                Collection::new()
            }
        }
    }

    /// Read the full collection. Never fails: read errors yield an empty collection.
    pub async fn read_all(&self, collection: &str) -> Collection {
        let _guard = self.lock(collection).await;
        self.load_or_empty(collection).await
    }

    /// Append a record. Duplicate ids are not checked.
    ///
    /// # Errors
    /// Returns error if the updated collection could not be saved.
    pub async fn append(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        let _guard = self.lock(collection).await;
        let mut records = self.load_for_write(collection).await;
        records.push(record);
        self.store.save(collection, &records).await
    }

    /// Remove every record with the given id. Returns how many were removed.
    ///
    /// # Errors
    /// Returns error if the updated collection could not be saved.
    pub async fn delete(&self, collection: &str, id: &RecordId) -> Result<usize, StoreError> {
        let _guard = self.lock(collection).await;
        let mut records = self.load_for_write(collection).await;
        let removed = records.remove_by_id(id);
        self.store.save(collection, &records).await?;
        Ok(removed)
    }

    /// Replace the first record sharing `record`'s id. Returns whether one matched.
    ///
    /// # Errors
    /// Returns error if the updated collection could not be saved.
    pub async fn update(&self, collection: &str, record: Record) -> Result<bool, StoreError> {
        let _guard = self.lock(collection).await;
        let mut records = self.load_for_write(collection).await;
        let replaced = records.replace_first(record);
        self.store.save(collection, &records).await?;
        Ok(replaced)
    }
}
