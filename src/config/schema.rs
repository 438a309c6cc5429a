//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the location client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API settings (base URL, timeouts).
    pub api: ApiConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Circuit breaker configuration.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Rating aggregation settings.
    pub aggregation: AggregationConfig,

    /// Token persistence settings.
    pub token_store: TokenStoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend (e.g., "http://localhost:5000/").
    pub base_url: String,

    /// Per-attempt request timeout in seconds.
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            request_timeout_secs: 10,
            user_agent: format!("location-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Enable retries.
    pub enabled: bool,

    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds. Doubles per retry.
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub max_delay_ms: u64,

    /// Add up to 10% random jitter on top of each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter: false,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the circuit breaker.
    pub enabled: bool,

    /// Consecutive failed calls before the circuit opens.
    pub failure_threshold: u32,

    /// How long the circuit stays open before admitting a trial call.
    pub break_duration_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            break_duration_secs: 30,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.break_duration_secs)
    }
}

/// Rating aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum in-flight per-location rating fetches.
    /// `None` (or 0) issues one concurrent fetch per location.
    pub max_concurrency: Option<usize>,

    /// Fetch the ratings collection once instead of once per location.
    pub batched: bool,
}

/// Token persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenStoreConfig {
    /// Path of the JSON file backing the token store.
    pub path: String,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            path: ".location-client/store.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record request/retry/breaker counters through the `metrics` facade.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
