//! Connection listener.

use std::{future::Future, net::SocketAddr, sync::Arc};

use roster_router::ActionRouter;
use roster_session::SessionRegistry;
use tokio::net::TcpListener;

use crate::websocket::{WsState, create_ws_router};

/// Listener error.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Listener failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Accepts WebSocket clients and starts a session for each.
///
/// Accept errors and failed handshakes are logged and never stop the
/// accept loop; only the shutdown signal does.
pub struct Listener {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: WsState,
}

impl Listener {
    /// Bind the endpoint.
    ///
    /// # Errors
    /// Returns error if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        router: Arc<ActionRouter>,
        registry: SessionRegistry,
    ) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            local_addr,
            state: WsState::new(router, registry),
        })
    }

    /// The bound address; differs from the requested one when port 0 was used.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry {
        &self.state.registry
    }

    /// Run the accept loop until `shutdown` resolves.
    ///
    /// Sessions already upgraded keep running until their clients leave.
    ///
    /// # Errors
    /// Returns error if the server stops for a reason other than shutdown.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ListenerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_ws_router(self.state);
        tracing::debug!(addr = %self.local_addr, "Accepting connections");

        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)?;

        tracing::info!("Listener stopped");
        Ok(())
    }
}
