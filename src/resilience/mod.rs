//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical request through the gateway:
//!     → circuit_breaker.rs (Open? fail fast, no network)
//!     → retries.rs (retry transient outcomes with backoff.rs delays)
//!         → timeouts.rs (deadline on each attempt)
//!             → transport
//!     → circuit_breaker.rs (record final outcome)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Only transient failures are retried (network, timeout, 408, 5xx)
//! - The breaker sees final outcomes, never individual retries
//! - Each policy is usable on its own; the gateway composes them

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitOpen, CircuitState};
pub use retries::{is_transient_status, RetryCause, RetryPolicy};
pub use timeouts::{with_timeout, TimedOut};
