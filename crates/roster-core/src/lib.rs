//! Core abstractions for the roster record broker.
//!
//! This crate provides the fundamental building blocks:
//! - `Request` / `Response` - The JSON message envelope
//! - `Record` / `Collection` - Id-keyed JSON records and their ordered sets
//! - `SessionContext` - Per-connection state visible to handlers
//! - `BrokerConfig` - Listener, storage and login settings
//! - Store and credential traits

pub mod config;
pub mod context;
pub mod message;
pub mod record;
pub mod traits;

pub use config::{AuthPolicy, BrokerConfig, ConfigError, CredentialsConfig};
pub use context::{SessionContext, SessionId};
pub use message::{ProtocolError, Request, Response};
pub use record::{Collection, CollectionName, Record, RecordId};
pub use traits::{CredentialChecker, RecordStore, StoreError};
