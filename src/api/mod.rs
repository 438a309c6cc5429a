//! Resource API subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → client.rs (build GatewayRequest, token from SessionManager)
//!     → ResilientGateway
//!     → wire.rs (normalise keys, decode)
//!     → models.rs (Location, Rating, LocationRating, ...)
//! ```

pub mod client;
pub mod models;
pub mod types;
pub mod wire;

pub use client::ResourceClient;
pub use models::{Location, LocationRating, NewRating, Rating, Session, User};
pub use types::{ApiError, ApiResult};
