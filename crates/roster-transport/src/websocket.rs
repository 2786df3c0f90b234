//! WebSocket transport.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use roster_router::ActionRouter;
use roster_session::{Connection, SessionRegistry, TransportError, serve_connection};
use tower_http::trace::TraceLayer;

/// A WebSocket carrying one request or response per text frame.
pub struct WsConnection {
    socket: WebSocket,
}

impl WsConnection {
    #[must_use]
    pub const fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn recv_frame(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(msg) = self.socket.recv().await {
            match msg {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(e) => {
                        tracing::warn!("Dropping non-UTF-8 binary frame: {e}");
                    }
                },
                Ok(Message::Close(_)) => return Ok(None),
                // Pings are answered by the socket itself
                Ok(_) => {}
                Err(e) => return Err(TransportError::Io(e.to_string())),
            }
        }
        Ok(None)
    }

    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        self.socket
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.socket
            .send(Message::Close(None))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// WebSocket handler state.
#[derive(Clone)]
pub struct WsState {
    /// Shared dispatch table.
    pub router: Arc<ActionRouter>,
    /// Open sessions.
    pub registry: SessionRegistry,
}

impl WsState {
    /// Create new WebSocket state.
    #[must_use]
    pub const fn new(router: Arc<ActionRouter>, registry: SessionRegistry) -> Self {
        Self { router, registry }
    }
}

/// WebSocket upgrade handler.
///
/// A failed upgrade is logged and affects only that connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_failed_upgrade(move |e| {
        tracing::warn!(%peer, "WebSocket handshake failed: {e}");
    })
    .on_upgrade(move |socket| {
        serve_connection(
            WsConnection::new(socket),
            Some(peer),
            state.router,
            state.registry,
        )
    })
}

/// Create WebSocket router.
///
/// The upgrade is served on both `/` and `/ws`. Must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[must_use]
pub fn create_ws_router(state: WsState) -> axum::Router {
    axum::Router::new()
        .route("/", axum::routing::get(ws_handler))
        .route("/ws", axum::routing::get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
