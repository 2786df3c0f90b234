//! Core traits for record persistence and login checks.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Collection;

/// Storage error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on collection {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Collection {collection} is not a JSON array of records: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode collection {collection}: {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Storage error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the collection has simply never been written.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Trait for collection persistence backends.
///
/// Implementations load and overwrite whole collections; partial updates
/// are layered on top by the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the full collection.
    async fn load(&self, collection: &str) -> Result<Collection, StoreError>;

    /// Overwrite the persisted collection in full.
    async fn save(&self, collection: &str, records: &Collection) -> Result<(), StoreError>;
}

/// Trait for login credential checks.
///
/// Implement this to replace the configured username/password pair with
/// another source of truth.
pub trait CredentialChecker: Send + Sync {
    /// Whether the pair is accepted.
    fn verify(&self, username: &str, password: &str) -> bool;
}
