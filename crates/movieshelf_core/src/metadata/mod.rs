//! Movie metadata provider contract.
//!
//! # Responsibility
//! - Describe the read-only catalog operations the app consumes.
//! - Keep provider HTTP details inside `tmdb`.

pub mod tmdb;

use crate::model::movie::{Movie, MovieDetails, MovieId};
use crate::model::release::ReleaseInfo;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use tmdb::TmdbClient;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Metadata provider failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("metadata API error: {0}")]
    Api(String),
    #[error("metadata resource not found")]
    NotFound,
    #[error("metadata API rate limited")]
    RateLimited,
    #[error("metadata API rejected the access token")]
    InvalidApiKey,
    #[error("metadata network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("metadata parse error: {0}")]
    Parse(String),
}

/// Read-only movie catalog.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Top-rated listing for a blank query, search results otherwise.
    async fn fetch_movies(&self, query: &str) -> CatalogResult<Vec<Movie>>;

    async fn fetch_movie_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetails>;

    /// Regional release dates, the input of certification lookup.
    async fn fetch_release_info(&self, movie_id: MovieId) -> CatalogResult<ReleaseInfo>;
}

#[async_trait]
impl<C: MovieCatalog + ?Sized> MovieCatalog for Arc<C> {
    async fn fetch_movies(&self, query: &str) -> CatalogResult<Vec<Movie>> {
        (**self).fetch_movies(query).await
    }

    async fn fetch_movie_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetails> {
        (**self).fetch_movie_details(movie_id).await
    }

    async fn fetch_release_info(&self, movie_id: MovieId) -> CatalogResult<ReleaseInfo> {
        (**self).fetch_release_info(movie_id).await
    }
}
