//! Session error definitions.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur while establishing a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Input rejected locally; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(&'static str),

    /// The backend answered with a non-success status.
    #[error("login rejected with status {status}: {payload}")]
    Rejected { status: u16, payload: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("could not decode response: {0}")]
    Decode(String),
}
