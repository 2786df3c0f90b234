//! Wire envelope for client-server communication.
//!
//! Requests are `{"action": ..., "payload": ...}` and responses are
//! `{"action": ..., "data": ...}`. Response actions name an outcome rather
//! than echoing the request action.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::record::Collection;

/// Response action for an accepted login.
pub const LOGIN_SUCCESS: &str = "loginSuccess";
/// Response action for a rejected login.
pub const LOGIN_FAILED: &str = "loginFailed";
/// Response action for any completed mutation.
pub const UPDATE_SUCCESS: &str = "updateSuccess";
/// Response action sent when login is required but the session has not logged in.
pub const LOGIN_REQUIRED: &str = "loginRequired";

/// Envelope parse error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Frame is not a message envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Action name used for dispatch.
    pub action: String,
    /// Action-dependent payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    /// Create a request without payload.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: None,
        }
    }

    /// Create a request carrying a payload.
    #[must_use]
    pub fn with_payload(action: impl Into<String>, payload: Value) -> Self {
        Self {
            action: action.into(),
            payload: Some(payload),
        }
    }

    /// Parse a text frame into a request.
    ///
    /// # Errors
    /// Returns error if the frame is not JSON, or is JSON without a string
    /// `action` field.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame).map_err(ProtocolError::InvalidJson)?;
        serde_json::from_value(value).map_err(ProtocolError::InvalidEnvelope)
    }

    /// Encode as a text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Message from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome action name.
    pub action: String,
    /// Optional result data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// Create a response without data.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            data: None,
        }
    }

    /// Create a response carrying data.
    #[must_use]
    pub fn with_data(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn login_success() -> Self {
        Self::new(LOGIN_SUCCESS)
    }

    #[must_use]
    pub fn login_failed() -> Self {
        Self::new(LOGIN_FAILED)
    }

    #[must_use]
    pub fn update_success() -> Self {
        Self::new(UPDATE_SUCCESS)
    }

    #[must_use]
    pub fn login_required() -> Self {
        Self::new(LOGIN_REQUIRED)
    }

    /// Create a response listing a whole collection.
    #[must_use]
    pub fn collection(action: impl Into<String>, collection: &Collection) -> Self {
        Self::with_data(action, collection.to_value())
    }

    /// Parse a text frame into a response.
    ///
    /// # Errors
    /// Returns error if the frame is not a response envelope.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame).map_err(ProtocolError::InvalidJson)?;
        serde_json::from_value(value).map_err(ProtocolError::InvalidEnvelope)
    }

    /// Encode as a text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_request_with_payload() {
        let req = Request::parse(r#"{"action":"addStudent","payload":{"id":"1"}}"#).unwrap();
        assert_eq!(req.action, "addStudent");
        assert_eq!(req.payload, Some(json!({"id": "1"})));
    }

    #[test]
    fn test_parse_request_without_payload() {
        let req = Request::parse(r#"{"action":"getStudents"}"#).unwrap();
        assert_eq!(req, Request::new("getStudents"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Request::parse("{not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_or_invalid_action() {
        assert!(matches!(
            Request::parse(r#"{"payload":{}}"#),
            Err(ProtocolError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            Request::parse(r#"{"action":42}"#),
            Err(ProtocolError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            Request::parse("[1,2,3]"),
            Err(ProtocolError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_response_omits_missing_data() {
        let json = Response::login_success().to_json().unwrap();
        assert_eq!(json, r#"{"action":"loginSuccess"}"#);
    }

    #[test]
    fn test_response_with_data() {
        let resp = Response::with_data("studentsData", json!([]));
        let json = resp.to_json().unwrap();
        assert_eq!(json, r#"{"action":"studentsData","data":[]}"#);
        assert_eq!(Response::parse(&json).unwrap(), resp);
    }
}
