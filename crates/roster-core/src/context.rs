//! Per-session state shared with action handlers.

use std::net::SocketAddr;

use uuid::Uuid;

/// Session identifier.
pub type SessionId = Uuid;

/// What a handler may see and change about the session that sent a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Unique session handle.
    pub id: SessionId,
    /// Remote address, when the transport knows it.
    pub peer: Option<SocketAddr>,
    /// Set by a successful login.
    pub authenticated: bool,
}

impl SessionContext {
    /// Create a context with a fresh id.
    #[must_use]
    pub fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            authenticated: false,
        }
    }

    /// Peer address for logging.
    #[must_use]
    pub fn peer_label(&self) -> String {
        self.peer
            .map_or_else(|| "unknown".to_string(), |addr| addr.to_string())
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(None)
    }
}
