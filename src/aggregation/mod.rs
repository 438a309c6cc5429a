//! Aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! list_locations_with_ratings
//!     → ResourceClient::list_locations
//!     → per location, concurrently: ResourceClient::list_ratings_for_location
//!     → merge by position, compute mean/count
//!     → locations in original order
//! ```

pub mod engine;

pub use engine::AggregationEngine;
