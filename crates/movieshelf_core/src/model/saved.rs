//! Saved-movie rows and the payload used to create them.
//!
//! # Invariants
//! - `key` is assigned at creation and never reused.
//! - `saved_at` is set once at creation and never rewritten.
//! - Display fields are snapshots taken at save time.

use super::movie::{Movie, MovieDetails, MovieId};
use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Opaque row-store key of a saved row.
pub type RowKey = String;

/// Saved-movie row as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRow {
    #[serde(rename = "$id")]
    pub key: RowKey,
    pub movie_id: MovieId,
    /// ISO-8601 UTC timestamp.
    pub saved_at: String,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<i64>,
}

/// Data fields written when a saved row is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSavedRow {
    pub movie_id: MovieId,
    pub saved_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    pub genre_ids: Vec<i64>,
}

/// Partial movie record accepted by the save operation.
///
/// Only `id` is required; everything else is copied when present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavePayload {
    pub id: MovieId,
    pub title: Option<String>,
    /// Relative poster path, turned into a CDN URL on save.
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    pub genre_ids: Option<Vec<i64>>,
}

impl SavePayload {
    pub fn new(id: MovieId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl From<&Movie> for SavePayload {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
            popularity: movie.popularity,
            release_date: movie.release_date.clone(),
            genre_ids: Some(movie.genre_ids.clone()),
        }
    }
}

impl From<&MovieDetails> for SavePayload {
    fn from(details: &MovieDetails) -> Self {
        Self {
            id: details.id,
            title: details.title.clone(),
            poster_path: details.poster_path.clone(),
            vote_average: details.vote_average,
            popularity: details.popularity,
            release_date: details.release_date.clone(),
            genre_ids: Some(details.genre_ids()),
        }
    }
}

/// Builds a CDN poster URL by plain concatenation.
///
/// Returns `None` for a missing or blank path; the path itself is not
/// validated.
pub fn poster_url(image_base_url: &str, poster_path: Option<&str>) -> Option<String> {
    poster_path
        .filter(|path| !path.trim().is_empty())
        .map(|path| format!("{image_base_url}{path}"))
}
