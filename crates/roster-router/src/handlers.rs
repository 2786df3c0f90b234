//! Action handlers.
//!
//! Every handler has the same shape: it receives the originating session
//! and the request payload, and produces at most one response for that
//! session. Store failures never reach the client.

use std::sync::Arc;

use async_trait::async_trait;
use roster_core::{
    CollectionName, CredentialChecker, Record, RecordId, Response, SessionContext,
};
use roster_store::CollectionService;
use serde_json::Value;
use thiserror::Error;

/// Handler error.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },
}

impl HandlerError {
    fn invalid(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for action handlers.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handle one request from `session`.
    ///
    /// # Returns
    /// The response to send back, or `None` to stay silent.
    async fn handle(
        &self,
        session: &mut SessionContext,
        payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError>;
}

/// Checks a username/password payload.
pub struct LoginHandler {
    checker: Arc<dyn CredentialChecker>,
}

impl LoginHandler {
    #[must_use]
    pub fn new(checker: Arc<dyn CredentialChecker>) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl ActionHandler for LoginHandler {
    async fn handle(
        &self,
        session: &mut SessionContext,
        payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError> {
        let accepted = match (
            str_field(payload.as_ref(), "username"),
            str_field(payload.as_ref(), "password"),
        ) {
            (Some(username), Some(password)) => self.checker.verify(username, password),
            _ => false,
        };

        if accepted {
            session.authenticated = true;
            tracing::info!(session = %session.id, "Login succeeded");
            Ok(Some(Response::login_success()))
        } else {
            tracing::info!(session = %session.id, "Login failed");
            Ok(Some(Response::login_failed()))
        }
    }
}

/// Returns a whole collection.
pub struct GetDataHandler {
    service: Arc<CollectionService>,
    collection: CollectionName,
}

impl GetDataHandler {
    #[must_use]
    pub const fn new(service: Arc<CollectionService>, collection: CollectionName) -> Self {
        Self { service, collection }
    }
}

#[async_trait]
impl ActionHandler for GetDataHandler {
    async fn handle(
        &self,
        _session: &mut SessionContext,
        _payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError> {
        let records = self.service.read_all(self.collection.as_str()).await;
        Ok(Some(Response::collection(
            self.collection.data_action(),
            &records,
        )))
    }
}

/// Appends the payload record.
pub struct AddHandler {
    service: Arc<CollectionService>,
    collection: CollectionName,
}

impl AddHandler {
    #[must_use]
    pub const fn new(service: Arc<CollectionService>, collection: CollectionName) -> Self {
        Self { service, collection }
    }
}

#[async_trait]
impl ActionHandler for AddHandler {
    async fn handle(
        &self,
        _session: &mut SessionContext,
        payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError> {
        let record = record_payload(self.collection, "add", payload)?;
        if let Err(e) = self.service.append(self.collection.as_str(), record).await {
            tracing::error!(collection = %self.collection, error = %e, "Failed to save after add");
        }
        Ok(Some(Response::update_success()))
    }
}

/// Removes every record with the payload id.
pub struct DeleteHandler {
    service: Arc<CollectionService>,
    collection: CollectionName,
}

impl DeleteHandler {
    #[must_use]
    pub const fn new(service: Arc<CollectionService>, collection: CollectionName) -> Self {
        Self { service, collection }
    }
}

#[async_trait]
impl ActionHandler for DeleteHandler {
    async fn handle(
        &self,
        _session: &mut SessionContext,
        payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError> {
        let id = payload
            .as_ref()
            .and_then(|p| p.get("id"))
            .and_then(RecordId::from_value)
            .ok_or_else(|| {
                HandlerError::invalid(
                    format!("delete {}", self.collection),
                    "payload.id must be a string or number",
                )
            })?;

        match self.service.delete(self.collection.as_str(), &id).await {
            Ok(removed) => {
                tracing::debug!(collection = %self.collection, %id, removed, "Deleted records");
            }
            Err(e) => {
                tracing::error!(collection = %self.collection, error = %e, "Failed to save after delete");
            }
        }
        Ok(Some(Response::update_success()))
    }
}

/// Replaces the first record sharing the payload's id.
pub struct UpdateHandler {
    service: Arc<CollectionService>,
    collection: CollectionName,
}

impl UpdateHandler {
    #[must_use]
    pub const fn new(service: Arc<CollectionService>, collection: CollectionName) -> Self {
        Self { service, collection }
    }
}

#[async_trait]
impl ActionHandler for UpdateHandler {
    async fn handle(
        &self,
        _session: &mut SessionContext,
        payload: Option<Value>,
    ) -> Result<Option<Response>, HandlerError> {
        let record = record_payload(self.collection, "update", payload)?;
        match self.service.update(self.collection.as_str(), record).await {
            Ok(false) => {
                tracing::debug!(collection = %self.collection, "Update matched no record");
            }
            Ok(true) => {}
            Err(e) => {
                tracing::error!(collection = %self.collection, error = %e, "Failed to save after update");
            }
        }
        Ok(Some(Response::update_success()))
    }
}

fn str_field<'a>(payload: Option<&'a Value>, name: &str) -> Option<&'a str> {
    payload.and_then(|p| p.get(name)).and_then(Value::as_str)
}

fn record_payload(
    collection: CollectionName,
    verb: &str,
    payload: Option<Value>,
) -> Result<Record, HandlerError> {
    payload
        .and_then(Record::from_value)
        .ok_or_else(|| {
            HandlerError::invalid(format!("{verb} {collection}"), "payload must be a JSON object")
        })
}
