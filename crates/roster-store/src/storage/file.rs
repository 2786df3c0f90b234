//! JSON file collection storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use roster_core::{Collection, RecordStore, StoreError};

/// Stores each collection as a pretty-printed JSON array in its own file.
///
/// ```text
/// data_dir/
/// ├── students.json
/// ├── teachers.json
/// └── admins.json
/// ```
///
/// Saves overwrite the file in place; a crash mid-write can leave a
/// truncated file, which later loads report as corrupt.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `data_dir`. The directory is created on first save.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the file path for a collection.
    #[must_use]
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{collection}.json"))
    }
}

fn io_error(collection: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        collection: collection.to_string(),
        source,
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn load(&self, collection: &str) -> Result<Collection, StoreError> {
        let path = self.collection_path(collection);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(collection, e))?;

        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            collection: collection.to_string(),
            source,
        })
    }

    async fn save(&self, collection: &str, records: &Collection) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(records).map_err(|source| StoreError::Encode {
            collection: collection.to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| io_error(collection, e))?;

        let path = self.collection_path(collection);
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| io_error(collection, e))?;

        tracing::trace!(path = %path.display(), records = records.len(), "Saved collection");
        Ok(())
    }
}
