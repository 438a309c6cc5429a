//! Location rating aggregation.
//!
//! # Responsibilities
//! - Enrich every location with the mean and count of its ratings
//! - Fan out one ratings fetch per location, concurrently
//! - Tolerate per-location failures without dropping any location
//!
//! # Design Decisions
//! - Results are keyed by list position and written back in the original order
//! - `average_rating` is cleared before recomputation; nothing survives from
//!   the wire or from an earlier call
//! - Concurrency is unbounded unless `max_concurrency` is set

use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;

use crate::api::models::Location;
use crate::api::types::ApiResult;
use crate::api::ResourceClient;
use crate::config::AggregationConfig;
use crate::observability::metrics;

/// Computes derived rating statistics for locations.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    client: ResourceClient,
    max_concurrency: Option<usize>,
    batched: bool,
}

impl AggregationEngine {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            max_concurrency: None,
            batched: false,
        }
    }

    pub fn from_config(client: ResourceClient, config: &AggregationConfig) -> Self {
        Self {
            client,
            max_concurrency: config.max_concurrency.filter(|n| *n > 0),
            batched: config.batched,
        }
    }

    /// Cap the number of in-flight rating fetches. `None` means one per location.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.filter(|n| *n > 0);
        self
    }

    /// Run whichever strategy the configuration selected.
    pub async fn aggregate(&self) -> ApiResult<Vec<Location>> {
        if self.batched {
            self.list_locations_with_ratings_batched().await
        } else {
            self.list_locations_with_ratings().await
        }
    }

    /// Fetch all locations and enrich each one from its own ratings fetch.
    ///
    /// Only a failure to list locations is an error. A failed ratings fetch
    /// leaves that location un-enriched.
    pub async fn list_locations_with_ratings(&self) -> ApiResult<Vec<Location>> {
        let mut locations = self.client.list_locations().await?;
        let limit = self.max_concurrency.unwrap_or(locations.len()).max(1);

        tracing::debug!(
            locations = locations.len(),
            concurrency = limit,
            "Aggregating ratings per location"
        );

        let targets: Vec<(usize, i64)> = locations.iter().map(|l| l.id).enumerate().collect();
        let mut results: HashMap<usize, _> = stream::iter(targets)
            .map(|(index, id)| async move { (index, self.client.list_ratings_for_location(id).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut failures = 0usize;
        for (index, location) in locations.iter_mut().enumerate() {
            location.average_rating = None;
            match results.remove(&index) {
                Some(Ok(ratings)) => apply_stats(location, ratings.iter().map(|r| r.rating)),
                Some(Err(e)) => {
                    failures += 1;
                    metrics::record_aggregation_failure();
                    tracing::warn!(
                        location_id = location.id,
                        error = %e,
                        "Ratings fetch failed, leaving location un-enriched"
                    );
                }
                None => {}
            }
        }

        tracing::info!(
            locations = locations.len(),
            failures = failures,
            "Rating aggregation complete"
        );
        Ok(locations)
    }

    /// Same contract as `list_locations_with_ratings`, but downloads the
    /// ratings collection once and groups it locally.
    pub async fn list_locations_with_ratings_batched(&self) -> ApiResult<Vec<Location>> {
        let mut locations = self.client.list_locations().await?;
        for location in locations.iter_mut() {
            location.average_rating = None;
        }

        match self.client.list_all_ratings().await {
            Ok(ratings) => {
                let mut by_location: HashMap<i64, Vec<i32>> = HashMap::new();
                for rating in ratings {
                    by_location.entry(rating.location_id).or_default().push(rating.stars);
                }
                for location in locations.iter_mut() {
                    let stars = by_location.get(&location.id).map(Vec::as_slice).unwrap_or(&[]);
                    apply_stats(location, stars.iter().copied());
                }
            }
            Err(e) => {
                metrics::record_aggregation_failure();
                tracing::warn!(error = %e, "Ratings fetch failed, returning locations un-enriched");
            }
        }

        Ok(locations)
    }
}

/// Set mean and count from the given star values.
fn apply_stats(location: &mut Location, stars: impl Iterator<Item = i32>) {
    let (count, sum) = stars.fold((0u32, 0i64), |(n, s), v| (n + 1, s + i64::from(v)));
    location.rating_count = count;
    location.average_rating = (count > 0).then(|| sum as f64 / f64::from(count));
}
