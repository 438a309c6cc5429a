//! Data model shared by the session and resource layers.
//!
//! Field names follow the backend's snake_case wire format; the few keys that
//! differ from the Rust names (`lat`, `lng`, `allowed`) are renamed here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::wire::nullable;

/// Authenticated user profile. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, alias = "user_name", deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Token plus profile, present only while authenticated.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// A rateable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "lat", alias = "latitude", default, deserialize_with = "nullable")]
    pub latitude: f64,
    #[serde(rename = "lng", alias = "longitude", default, deserialize_with = "nullable")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// Derived client-side by the aggregation engine.
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub rating_count: u32,
    #[serde(rename = "allowed", alias = "is_allowed", default, deserialize_with = "nullable")]
    pub is_allowed: bool,
    #[serde(default)]
    pub owner_user_id: Option<i64>,
}

/// Rating as the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub stars: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    pub location_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Client-facing projection of a `Rating`.
///
/// The backend does not return author names or timestamps with ratings, so
/// `username` and `created_at` stay `None` when projected from a `Rating`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRating {
    pub id: i64,
    pub location_id: i64,
    pub username: Option<String>,
    pub rating: i32,
    pub comment: String,
    pub created_at: Option<String>,
}

impl From<Rating> for LocationRating {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            location_id: rating.location_id,
            username: None,
            rating: rating.stars,
            comment: rating.description,
            created_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default, deserialize_with = "nullable")]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirmation: &'a str,
}

/// Body of `POST api/ratings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRating {
    pub location_id: i64,
    pub stars: i32,
    pub description: String,
}
