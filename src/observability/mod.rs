//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway, resilience, session, aggregation produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is attached to every gateway log record
//! - Metrics are cheap counter increments and can be switched off

pub mod logging;
pub mod metrics;
