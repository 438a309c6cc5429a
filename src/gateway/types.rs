//! Request, response and error types for the gateway.

use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the gateway after all policies have run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The circuit breaker rejected the call without touching the network.
    #[error("circuit open, retry in {0:?}")]
    CircuitOpen(Duration),

    /// Every attempt exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (refused, reset, DNS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be built (bad path, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Network errors and timeouts are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Timeout(_) | GatewayError::Network(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A single logical request to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `api/locations/3`.
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Bearer token sent in the `Authorization` header.
    pub token: Option<String>,
}

impl GatewayRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> GatewayResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| GatewayError::InvalidRequest(format!("body serialization: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach a bearer token if one is present.
    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Raw response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = GatewayRequest::post("api/login")
            .json(&serde_json::json!({ "username": "ana" }))
            .unwrap()
            .bearer(Some("t0k".into()));

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "api/login");
        assert_eq!(req.body.unwrap()["username"], "ana");
        assert_eq!(req.token.as_deref(), Some("t0k"));
    }

    #[test]
    fn test_error_classification() {
        assert!(GatewayError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(GatewayError::Network("reset".into()).is_transient());
        assert!(!GatewayError::CircuitOpen(Duration::ZERO).is_transient());
        assert!(!GatewayError::InvalidRequest("x".into()).is_transient());
    }

    #[test]
    fn test_response_status_helpers() {
        assert!(GatewayResponse::new(204, "").is_success());
        assert!(!GatewayResponse::new(404, "").is_success());
        assert!(GatewayResponse::new(401, "").is_unauthorized());
    }
}
