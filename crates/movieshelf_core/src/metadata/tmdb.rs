//! TMDB v3 HTTP client.
//!
//! # Invariants
//! - Every request carries `Authorization: Bearer <api_key>`; an empty key
//!   is sent as-is and fails remotely.
//! - Non-success statuses map to `CatalogError` variants by status code.

use super::{CatalogError, CatalogResult, MovieCatalog};
use crate::config::MetadataConfig;
use crate::model::movie::{Movie, MovieDetails, MovieId, MoviePage};
use crate::model::release::ReleaseInfo;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Request target: path under the API root plus query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    path: String,
    query: Vec<(&'static str, String)>,
}

#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    status_message: Option<String>,
}

/// Catalog backed by the TMDB REST API.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: Client,
    config: MetadataConfig,
}

impl TmdbClient {
    /// # Errors
    /// - `Network` when the HTTP client cannot be constructed.
    pub fn new(config: MetadataConfig) -> CatalogResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> CatalogResult<T> {
        let started_at = Instant::now();
        let url = format!("{}{}", self.config.base_url, endpoint.path);
        debug!(
            "event=catalog_request module=metadata status=start path={}",
            endpoint.path
        );

        let response = self
            .http
            .get(&url)
            .query(&endpoint.query)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .inspect_err(|err| {
                warn!(
                    "event=catalog_request module=metadata status=error path={} error_code=network error={err}",
                    endpoint.path
                );
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = error_for_status(status.as_u16(), &body);
            warn!(
                "event=catalog_request module=metadata status=error path={} http_status={} duration_ms={} error={err}",
                endpoint.path,
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(err);
        }

        debug!(
            "event=catalog_request module=metadata status=ok path={} duration_ms={}",
            endpoint.path,
            started_at.elapsed().as_millis()
        );
        serde_json::from_str(&body).map_err(|err| CatalogError::Parse(err.to_string()))
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn fetch_movies(&self, query: &str) -> CatalogResult<Vec<Movie>> {
        let page: MoviePage = self
            .get_json(movies_endpoint(query, &self.config.language))
            .await?;
        Ok(page.results)
    }

    async fn fetch_movie_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetails> {
        self.get_json(Endpoint {
            path: format!("/movie/{movie_id}"),
            query: Vec::new(),
        })
        .await
    }

    async fn fetch_release_info(&self, movie_id: MovieId) -> CatalogResult<ReleaseInfo> {
        self.get_json(Endpoint {
            path: format!("/movie/{movie_id}/release_dates"),
            query: Vec::new(),
        })
        .await
    }
}

fn movies_endpoint(query: &str, language: &str) -> Endpoint {
    let query = query.trim();
    if query.is_empty() {
        Endpoint {
            path: "/movie/top_rated".to_string(),
            query: vec![("language", language.to_string()), ("page", "1".to_string())],
        }
    } else {
        // reqwest percent-encodes query values.
        Endpoint {
            path: "/search/movie".to_string(),
            query: vec![("query", query.to_string())],
        }
    }
}

fn error_for_status(status: u16, body: &str) -> CatalogError {
    match status {
        401 => CatalogError::InvalidApiKey,
        404 => CatalogError::NotFound,
        429 => CatalogError::RateLimited,
        _ => {
            let message = serde_json::from_str::<TmdbErrorBody>(body)
                .ok()
                .and_then(|body| body.status_message)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            CatalogError::Api(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{error_for_status, movies_endpoint};
    use crate::metadata::CatalogError;

    #[test]
    fn blank_query_lists_top_rated() {
        let endpoint = movies_endpoint("   ", "en-US");
        assert_eq!(endpoint.path, "/movie/top_rated");
        assert!(endpoint
            .query
            .contains(&("language", "en-US".to_string())));
    }

    #[test]
    fn non_blank_query_searches_trimmed_text() {
        let endpoint = movies_endpoint(" the thing ", "en-US");
        assert_eq!(endpoint.path, "/search/movie");
        assert_eq!(endpoint.query, vec![("query", "the thing".to_string())]);
    }

    #[test]
    fn statuses_map_to_errors() {
        assert!(matches!(error_for_status(401, ""), CatalogError::InvalidApiKey));
        assert!(matches!(error_for_status(404, ""), CatalogError::NotFound));
        assert!(matches!(error_for_status(429, ""), CatalogError::RateLimited));
        match error_for_status(500, r#"{"status_message":"Internal error."}"#) {
            CatalogError::Api(message) => assert_eq!(message, "Internal error."),
            other => panic!("unexpected error: {other}"),
        }
    }
}
