//! Typed operations against the locations and ratings endpoints.
//!
//! # Responsibilities
//! - Build requests, attach the bearer token, decode responses
//! - Reads send the token when one is stored but do not require it
//! - Writes require a token and fail locally without one
//! - A 401 on a request that carried a token clears the session

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::models::{Location, LocationRating, NewRating, Rating};
use crate::api::types::{ApiError, ApiResult};
use crate::api::wire;
use crate::gateway::{GatewayRequest, GatewayResponse, ResilientGateway};
use crate::session::SessionManager;

/// Client for location and rating resources.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    gateway: Arc<ResilientGateway>,
    session: Arc<SessionManager>,
}

impl ResourceClient {
    pub fn new(gateway: Arc<ResilientGateway>, session: Arc<SessionManager>) -> Self {
        Self { gateway, session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// `GET api/locations`.
    pub async fn list_locations(&self) -> ApiResult<Vec<Location>> {
        let response = self.read("api/locations").await?;
        decode_success(response)
    }

    /// `GET api/locations/{id}`. A 404 is `Ok(None)`.
    pub async fn get_location(&self, id: i64) -> ApiResult<Option<Location>> {
        let response = self.read(&format!("api/locations/{}", id)).await?;
        decode_optional(response)
    }

    /// `GET api/locations/best`. A 404 (no rated locations) is `Ok(None)`.
    pub async fn get_best_rated_location(&self) -> ApiResult<Option<Location>> {
        let response = self.read("api/locations/best").await?;
        decode_optional(response)
    }

    /// `GET api/ratings`: every rating the backend knows about.
    pub async fn list_all_ratings(&self) -> ApiResult<Vec<Rating>> {
        let response = self.read("api/ratings").await?;
        decode_success(response)
    }

    /// Ratings for one location.
    ///
    /// The backend has no per-location filter, so this downloads every rating
    /// and filters locally. Prefer the aggregation engine's batched path when
    /// many locations are needed.
    pub async fn list_ratings_for_location(&self, location_id: i64) -> ApiResult<Vec<LocationRating>> {
        let ratings = self.list_all_ratings().await?;
        Ok(ratings
            .into_iter()
            .filter(|r| r.location_id == location_id)
            .map(LocationRating::from)
            .collect())
    }

    /// `POST api/ratings`. Requires a stored token.
    ///
    /// Returns the created rating when the backend echoes it back.
    pub async fn submit_rating(
        &self,
        location_id: i64,
        stars: i32,
        comment: &str,
    ) -> ApiResult<Option<Rating>> {
        if !(1..=5).contains(&stars) {
            return Err(ApiError::Validation(format!("stars must be between 1 and 5, got {}", stars)));
        }

        let token = match self.session.token().await {
            Some(token) => token,
            None => {
                tracing::warn!(location_id = location_id, "Rating not submitted: not authenticated");
                return Err(ApiError::Unauthenticated);
            }
        };

        let body = NewRating {
            location_id,
            stars,
            description: comment.to_string(),
        };
        let request = GatewayRequest::post("api/ratings")
            .json(&body)?
            .bearer(Some(token.clone()));

        let response = self.send(request, Some(token)).await?;
        if !response.is_success() {
            return Err(status_error(response));
        }
        if response.body.trim().is_empty() {
            return Ok(None);
        }

        tracing::info!(location_id = location_id, stars = stars, "Rating submitted");
        wire::decode(&response.body)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// GET with the current token, if any.
    async fn read(&self, path: &str) -> ApiResult<GatewayResponse> {
        let token = self.session.token().await;
        let request = GatewayRequest::get(path).bearer(token.clone());
        self.send(request, token).await
    }

    async fn send(&self, request: GatewayRequest, token: Option<String>) -> ApiResult<GatewayResponse> {
        let path = request.path.clone();
        let response = self.gateway.execute(request).await?;

        if response.is_unauthorized() {
            if let Some(token) = token {
                tracing::info!(path = %path, "Token rejected by backend, clearing session");
                self.session.invalidate(&token).await;
                return Err(ApiError::Unauthorized);
            }
        }

        Ok(response)
    }
}

fn status_error(response: GatewayResponse) -> ApiError {
    ApiError::Status {
        status: response.status,
        body: response.body,
    }
}

fn decode_success<T: DeserializeOwned>(response: GatewayResponse) -> ApiResult<T> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    wire::decode(&response.body).map_err(|e| {
        tracing::error!(error = %e, "Response could not be decoded");
        ApiError::Decode(e.to_string())
    })
}

fn decode_optional<T: DeserializeOwned>(response: GatewayResponse) -> ApiResult<Option<T>> {
    if response.status == 404 {
        return Ok(None);
    }
    decode_success(response).map(Some)
}
