//! Error types for resource operations.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during resource operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Input rejected locally; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation needs a token and none is stored; nothing was sent.
    #[error("not authenticated")]
    Unauthenticated,

    /// The backend answered 401 to an authenticated call; the session was cleared.
    #[error("unauthorized, session invalidated")]
    Unauthorized,

    /// Any other non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Result type for resource operations.
pub type ApiResult<T> = Result<T, ApiError>;
