//! Movie listing and search, with search-term tracking.

use crate::metadata::{CatalogResult, MovieCatalog};
use crate::model::movie::Movie;
use crate::repo::search_metrics::SearchMetricsGateway;
use crate::store::RowStore;
use log::warn;

pub struct BrowseService<C, S> {
    catalog: C,
    metrics: Option<SearchMetricsGateway<S>>,
}

impl<C: MovieCatalog, S: RowStore> BrowseService<C, S> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            metrics: None,
        }
    }

    /// Records the top result of every non-blank search.
    pub fn with_metrics(mut self, metrics: SearchMetricsGateway<S>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Top-rated movies for a blank query, search results otherwise.
    ///
    /// Tracking failures are logged and never fail the listing.
    pub async fn browse(&self, query: &str) -> CatalogResult<Vec<Movie>> {
        let movies = self.catalog.fetch_movies(query).await?;

        let term = query.trim();
        if let (Some(metrics), Some(top), false) = (&self.metrics, movies.first(), term.is_empty()) {
            if let Err(err) = metrics.record_search(term, top).await {
                warn!(
                    "event=search_metric module=service status=error error_code={} error={err}",
                    err.kind
                );
            }
        }

        Ok(movies)
    }
}
