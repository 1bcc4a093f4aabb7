//! Per-search-term counter rows.

use super::movie::MovieId;
use super::saved::RowKey;
use serde::{Deserialize, Serialize};

/// One counter row; at most one per search term is maintained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMetric {
    #[serde(rename = "$id")]
    pub key: RowKey,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub count: i64,
    pub poster_url: Option<String>,
}

/// Data fields written when a counter row is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSearchMetric {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub movie_id: MovieId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}
