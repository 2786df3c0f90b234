//! Transport seam for one client connection.

use async_trait::async_trait;

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
    #[error("Transport error: {0}")]
    Io(String),
}

/// A full-duplex connection carrying whole text frames.
///
/// Implementations deliver one complete message per `recv_frame` call;
/// framing is the transport's job.
#[async_trait]
pub trait Connection: Send {
    /// Wait for the next text frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn recv_frame(&mut self) -> Result<Option<String>, TransportError>;

    /// Write one text frame.
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError>;

    /// Start a clean close from this side.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[cfg(feature = "memory")]
pub use memory::{MemoryClient, MemoryConnection, SendError};

#[cfg(feature = "memory")]
mod memory {
    use async_trait::async_trait;
    use roster_core::{Request, Response};
    use tokio::sync::mpsc;

    use super::{Connection, TransportError};

    enum Inbound {
        Frame(String),
        Fail(String),
    }

    /// Send error.
    #[derive(Debug, thiserror::Error)]
    pub enum SendError {
        #[error("Channel closed")]
        ChannelClosed,
        #[error("Failed to encode request: {0}")]
        Encode(#[from] roster_core::ProtocolError),
    }

    /// Server side of an in-process connection.
    pub struct MemoryConnection {
        inbound_rx: mpsc::UnboundedReceiver<Inbound>,
        outbound_tx: Option<mpsc::UnboundedSender<String>>,
    }

    impl MemoryConnection {
        /// Create a connected pair.
        ///
        /// Returns the server side and the client side.
        #[must_use]
        pub fn pair() -> (Self, MemoryClient) {
            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

            let connection = Self {
                inbound_rx,
                outbound_tx: Some(outbound_tx),
            };
            let client = MemoryClient {
                inbound_tx: Some(inbound_tx),
                outbound_rx,
            };

            (connection, client)
        }
    }

    #[async_trait]
    impl Connection for MemoryConnection {
        async fn recv_frame(&mut self) -> Result<Option<String>, TransportError> {
            match self.inbound_rx.recv().await {
                Some(Inbound::Frame(text)) => Ok(Some(text)),
                Some(Inbound::Fail(reason)) => Err(TransportError::Io(reason)),
                None => Ok(None),
            }
        }

        async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
            self.outbound_tx
                .as_ref()
                .ok_or(TransportError::Closed)?
                .send(frame)
                .map_err(|_| TransportError::Closed)
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.inbound_rx.close();
            self.outbound_tx = None;
            Ok(())
        }
    }

    /// Client side of an in-process connection.
    pub struct MemoryClient {
        inbound_tx: Option<mpsc::UnboundedSender<Inbound>>,
        outbound_rx: mpsc::UnboundedReceiver<String>,
    }

    impl MemoryClient {
        fn push(&self, inbound: Inbound) -> Result<(), SendError> {
            self.inbound_tx
                .as_ref()
                .ok_or(SendError::ChannelClosed)?
                .send(inbound)
                .map_err(|_| SendError::ChannelClosed)
        }

        /// Send a raw text frame.
        ///
        /// # Errors
        /// Returns error if the server side is gone.
        pub fn send_text(&self, text: impl Into<String>) -> Result<(), SendError> {
            self.push(Inbound::Frame(text.into()))
        }

        /// Send a request envelope.
        ///
        /// # Errors
        /// Returns error if the server side is gone.
        pub fn send_request(&self, request: &Request) -> Result<(), SendError> {
            self.send_text(request.to_json()?)
        }

        /// Make the server's next read fail with a transport error.
        ///
        /// # Errors
        /// Returns error if the server side is gone.
        pub fn fail(&self, reason: impl Into<String>) -> Result<(), SendError> {
            self.push(Inbound::Fail(reason.into()))
        }

        /// Wait for the next frame written by the server.
        ///
        /// Returns `None` once the server side is closed.
        pub async fn recv_text(&mut self) -> Option<String> {
            self.outbound_rx.recv().await
        }

        /// Wait for the next response written by the server.
        ///
        /// Frames that are not response envelopes are skipped.
        pub async fn recv_response(&mut self) -> Option<Response> {
            while let Some(text) = self.recv_text().await {
                if let Ok(response) = Response::parse(&text) {
                    return Some(response);
                }
            }
            None
        }

        /// Frame already written by the server, if any.
        pub fn try_recv_text(&mut self) -> Option<String> {
            self.outbound_rx.try_recv().ok()
        }

        /// Stop accepting frames from the server while still sending.
        ///
        /// Every later server write fails.
        pub fn stop_reading(&mut self) {
            self.outbound_rx.close();
        }

        /// Close the client side. The server then reads a clean close.
        pub fn close(&mut self) {
            self.inbound_tx = None;
        }
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut conn, mut client) = MemoryConnection::pair();

        client.send_text("hello").unwrap();
        assert_eq!(conn.recv_frame().await.unwrap().as_deref(), Some("hello"));

        conn.send_frame("world".to_string()).await.unwrap();
        assert_eq!(client.recv_text().await.as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_client_close_is_clean() {
        let (mut conn, mut client) = MemoryConnection::pair();
        client.close();
        assert!(conn.recv_frame().await.unwrap().is_none());
        assert!(client.send_text("late").is_err());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let (mut conn, client) = MemoryConnection::pair();
        client.fail("reset by peer").unwrap();
        assert!(matches!(
            conn.recv_frame().await,
            Err(TransportError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_reading_fails_server_writes() {
        let (mut conn, mut client) = MemoryConnection::pair();
        client.stop_reading();
        assert!(matches!(
            conn.send_frame("x".to_string()).await,
            Err(TransportError::Closed)
        ));

        client.send_text("still flowing").unwrap();
        assert_eq!(
            conn.recv_frame().await.unwrap().as_deref(),
            Some("still flowing")
        );
    }

    #[tokio::test]
    async fn test_server_close() {
        let (mut conn, mut client) = MemoryConnection::pair();
        conn.close().await.unwrap();
        assert!(conn.send_frame("x".to_string()).await.is_err());
        assert!(client.recv_text().await.is_none());
    }
}
