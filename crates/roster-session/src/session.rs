//! One client session and its read loop.

use std::{net::SocketAddr, sync::Arc};

use roster_core::{ProtocolError, Request, Response, SessionContext, SessionId};
use roster_router::ActionRouter;
use thiserror::Error;

use crate::{
    connection::{Connection, TransportError},
    registry::{SessionEntry, SessionRegistry},
};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted but not yet registered.
    Connecting,
    /// Registered and reading requests.
    Open,
    /// Close started from this side.
    Closing,
    /// Transport gone; the read loop has ended or is about to.
    Closed,
}

/// Session error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] ProtocolError),
    #[error("Session closed")]
    Closed,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One client connection.
///
/// The session is the only writer to its connection: responses are sent
/// from its own read loop through `&mut self`, so frames never interleave.
pub struct Session<C> {
    context: SessionContext,
    connection: C,
    state: SessionState,
}

impl<C: Connection> Session<C> {
    /// Wrap an accepted connection.
    pub fn new(connection: C, peer: Option<SocketAddr>) -> Self {
        Self {
            context: SessionContext::new(peer),
            connection,
            state: SessionState::Connecting,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.context.id
    }

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Mark the session open. Only a connecting session can open.
    pub fn open(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Open;
        }
    }

    /// Wait for the next request.
    ///
    /// # Errors
    /// `Malformed` if the frame is not a request envelope; the session stays
    /// open. `Closed` or `Transport` once the connection is gone; the
    /// session is then `Closed`.
    pub async fn receive(&mut self) -> Result<Request, SessionError> {
        if self.state != SessionState::Open {
            return Err(SessionError::Closed);
        }

        match self.connection.recv_frame().await {
            Ok(Some(frame)) => {
                tracing::trace!(session = %self.context.id, %frame, "Received frame");
                Ok(Request::parse(&frame)?)
            }
            Ok(None) => {
                self.state = SessionState::Closed;
                Err(SessionError::Closed)
            }
            Err(e) => {
                self.state = SessionState::Closed;
                Err(e.into())
            }
        }
    }

    /// Write one response.
    ///
    /// # Errors
    /// Returns error if the session is not open or the write fails. The
    /// response is not retried.
    pub async fn send(&mut self, response: &Response) -> Result<(), SessionError> {
        if self.state != SessionState::Open {
            return Err(SessionError::Closed);
        }
        let frame = response.to_json()?;
        self.connection.send_frame(frame).await?;
        Ok(())
    }

    /// Close the connection from this side.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closing;
        if let Err(e) = self.connection.close().await {
            tracing::debug!(session = %self.context.id, error = %e, "Close handshake failed");
        }
        self.state = SessionState::Closed;
    }

    /// Read and dispatch requests until the connection closes.
    ///
    /// Requests are handled strictly one at a time, in arrival order.
    /// Malformed frames and failed writes are logged and skipped.
    pub async fn run(&mut self, router: &ActionRouter) {
        while self.state == SessionState::Open {
            let request = match self.receive().await {
                Ok(request) => request,
                Err(SessionError::Malformed(e)) => {
                    tracing::warn!(session = %self.context.id, error = %e, "Error parsing message");
                    continue;
                }
                Err(SessionError::Closed) => {
                    tracing::info!(session = %self.context.id, "Client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::error!(session = %self.context.id, error = %e, "Connection failed");
                    break;
                }
            };

            let Some(response) = router.dispatch(&mut self.context, request).await else {
                continue;
            };

            if let Err(e) = self.send(&response).await {
                tracing::error!(session = %self.context.id, error = %e, "Error sending message");
            }
        }
        self.close().await;
    }
}

/// Run a freshly accepted connection to completion.
///
/// Registers the session, runs its read loop and removes it from the
/// registry once the connection is gone.
pub async fn serve_connection<C: Connection>(
    connection: C,
    peer: Option<SocketAddr>,
    router: Arc<ActionRouter>,
    registry: SessionRegistry,
) {
    let mut session = Session::new(connection, peer);
    let id = session.id();

    if let Err(e) = registry.register(id, SessionEntry::new(peer)).await {
        tracing::error!(error = %e, "Failed to register session");
        session.close().await;
        return;
    }

    session.open();
    tracing::info!(session = %id, peer = %session.context().peer_label(), "Client connected");

    session.run(&router).await;

    registry.unregister(&id).await;
    let open_sessions = registry.len().await;
    tracing::debug!(session = %id, open_sessions, "Session removed");
}
