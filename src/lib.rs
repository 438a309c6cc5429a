//! Resilient client for the location/rating REST API.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller (CLI / UI)
//!         │
//!         ├──▶ session::SessionManager ──┐    login, register, logout, refresh
//!         │                               │
//!         ├──▶ api::ResourceClient ───────┤    locations, ratings
//!         │                               │
//!         └──▶ aggregation::Engine ───────┤    concurrent per-location fan-out
//!                                         ▼
//!                            gateway::ResilientGateway
//!                     circuit breaker → retry → timeout
//!                                         │
//!                                         ▼
//!                              gateway::Transport (reqwest)
//!                                         │
//!                                         ▼
//!                                    REST backend
//!
//!     Cross-cutting: config (TOML + env), observability (tracing, metrics)
//! ```

pub mod aggregation;
pub mod api;
pub mod client;
pub mod config;
pub mod gateway;
pub mod observability;
pub mod resilience;
pub mod session;

pub use client::LocationClient;
pub use config::ClientConfig;
pub use gateway::ResilientGateway;
pub use session::SessionManager;
