//! Network transport for the roster broker.
//!
//! Provides:
//! - WebSocket `Connection` implementation (feature: websocket)
//! - `Listener` - Accept loop with upgrade handshake and graceful shutdown

#[cfg(feature = "websocket")]
pub mod listener;

#[cfg(feature = "websocket")]
pub mod websocket;

#[cfg(feature = "websocket")]
pub use listener::{Listener, ListenerError};

#[cfg(feature = "websocket")]
pub use websocket::{WsConnection, WsState, create_ws_router};
