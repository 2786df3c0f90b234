//! Registry of open sessions.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use roster_core::SessionId;
use tokio::sync::RwLock;

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Session already registered: {0}")]
    AlreadyRegistered(SessionId),
}

/// What the registry knows about an open session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Remote address, when known.
    pub peer: Option<SocketAddr>,
    /// Registration timestamp (Unix epoch seconds).
    pub connected_at: i64,
}

impl SessionEntry {
    #[must_use]
    pub fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            peer,
            connected_at: now(),
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// The set of open sessions.
///
/// Cloning shares the same underlying set. The listener path adds entries
/// and each finished read loop removes its own. Responses go straight back
/// through the originating session, so the registry is never used for
/// broadcast.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new open session.
    ///
    /// # Errors
    /// Returns error if the id is already registered.
    pub async fn register(&self, id: SessionId, entry: SessionEntry) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        sessions.insert(id, entry);
        Ok(())
    }

    /// Remove a session. Returns its entry if it was registered.
    pub async fn unregister(&self, id: &SessionId) -> Option<SessionEntry> {
        self.sessions.write().await.remove(id)
    }

    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionEntry> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Ids of all open sessions at this point in time.
    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use roster_core::SessionContext;
    use tokio_test::assert_ok;

    use super::*;

    fn fresh_id() -> SessionId {
        SessionContext::default().id
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let registry = SessionRegistry::new();
        let id = fresh_id();
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        assert_ok!(registry.register(id, SessionEntry::new(Some(peer))).await);
        assert!(registry.contains(&id).await);
        assert_eq!(registry.get(&id).await.and_then(|e| e.peer), Some(peer));
        assert_eq!(registry.ids().await, vec![id]);

        assert!(registry.unregister(&id).await.is_some());
        assert!(registry.unregister(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = SessionRegistry::new();
        let id = fresh_id();
        registry.register(id, SessionEntry::new(None)).await.unwrap();
        assert!(matches!(
            registry.register(id, SessionEntry::new(None)).await,
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_add_remove() {
        let registry = SessionRegistry::new();
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let id = fresh_id();
                    registry.register(id, SessionEntry::new(None)).await.unwrap();
                    tokio::task::yield_now().await;
                    registry.unregister(&id).await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }
        assert_eq!(registry.len().await, 0);
    }
}
