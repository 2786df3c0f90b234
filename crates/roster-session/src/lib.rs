//! Client sessions for the roster broker.
//!
//! Provides:
//! - `Connection` - Transport seam for one framed, full-duplex connection
//! - `Session` - Lifecycle state and the per-connection read loop
//! - `SessionRegistry` - The set of open sessions

pub mod connection;
pub mod registry;
pub mod session;

pub use connection::{Connection, TransportError};
pub use registry::{RegistryError, SessionEntry, SessionRegistry};
pub use session::{Session, SessionError, SessionState, serve_connection};
