//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → sections handed to gateway, aggregation, token store, logging
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AggregationConfig, ApiConfig, CircuitBreakerConfig, ClientConfig, ObservabilityConfig,
    RetryConfig, TokenStoreConfig,
};
