use async_trait::async_trait;
use movieshelf_core::metadata::{CatalogError, CatalogResult, MovieCatalog};
use movieshelf_core::model::movie::{Movie, MovieDetails, MovieId};
use movieshelf_core::model::release::ReleaseInfo;
use movieshelf_core::model::search_metric::SearchMetric;
use movieshelf_core::repo::search_metrics::SearchMetricsGateway;
use movieshelf_core::service::browse::BrowseService;
use movieshelf_core::service::movie_detail::MovieDetailService;
use movieshelf_core::store::{Query, RowStore, TableRef};
use movieshelf_core::SqliteRowStore;
use serde_json::json;
use std::sync::Arc;

/// Catalog serving fixed JSON fixtures.
struct FixtureCatalog {
    movies: Vec<Movie>,
    release_info: Option<ReleaseInfo>,
}

impl FixtureCatalog {
    fn new() -> Self {
        let movies = serde_json::from_value(json!([
            {"id": 949, "title": "Heat", "poster_path": "/heat.jpg", "genre_ids": [28, 80]},
            {"id": 8068, "title": "Desperado"}
        ]))
        .unwrap();
        let release_info = serde_json::from_value(json!({
            "id": 949,
            "results": [
                {"iso_3166_1": "DE", "release_dates": [{"type": 3, "certification": "12"}]},
                {"iso_3166_1": "US", "release_dates": [
                    {"type": 5, "certification": "PG-13"},
                    {"type": 3, "certification": " R "}
                ]}
            ]
        }))
        .unwrap();
        Self {
            movies,
            release_info: Some(release_info),
        }
    }
}

#[async_trait]
impl MovieCatalog for FixtureCatalog {
    async fn fetch_movies(&self, _query: &str) -> CatalogResult<Vec<Movie>> {
        Ok(self.movies.clone())
    }

    async fn fetch_movie_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetails> {
        if movie_id != 949 {
            return Err(CatalogError::NotFound);
        }
        serde_json::from_value(json!({
            "id": 949,
            "title": "Heat",
            "release_date": "1995-12-15",
            "runtime": 170,
            "vote_average": 7.9,
            "vote_count": 7000,
            "popularity": 40.2,
            "budget": 60000000,
            "revenue": 0,
            "poster_path": "/heat.jpg",
            "genres": [{"id": 28, "name": "Action"}, {"id": 80, "name": "Crime"}],
            "production_companies": [
                {"id": 1, "name": "Regency Enterprises"},
                {"id": 2, "name": "Forward Pass"}
            ]
        }))
        .map_err(|err| CatalogError::Parse(err.to_string()))
    }

    async fn fetch_release_info(&self, _movie_id: MovieId) -> CatalogResult<ReleaseInfo> {
        self.release_info
            .clone()
            .ok_or_else(|| CatalogError::Api("release dates unavailable".to_string()))
    }
}

fn metrics_table() -> TableRef {
    TableRef::new("shelf", "metrics")
}

fn browse_service() -> (
    Arc<SqliteRowStore>,
    BrowseService<FixtureCatalog, Arc<SqliteRowStore>>,
) {
    let store = Arc::new(SqliteRowStore::open_in_memory().unwrap());
    let metrics = SearchMetricsGateway::new(Arc::clone(&store), metrics_table(), "https://img.test");
    let service = BrowseService::new(FixtureCatalog::new()).with_metrics(metrics);
    (store, service)
}

async fn metric_rows(store: &SqliteRowStore) -> Vec<SearchMetric> {
    store
        .list_rows(&metrics_table(), &[Query::Limit(100)])
        .await
        .unwrap()
        .rows
        .iter()
        .map(|row| row.decode().unwrap())
        .collect()
}

#[tokio::test]
async fn repeated_searches_increment_one_counter() {
    let (store, service) = browse_service();

    service.browse("heat").await.unwrap();
    service.browse("  heat ").await.unwrap();

    let metrics = metric_rows(&store).await;
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].search_term, "heat");
    assert_eq!(metrics[0].count, 2);
    assert_eq!(metrics[0].movie_id, 949);
    assert_eq!(metrics[0].poster_url.as_deref(), Some("https://img.test/heat.jpg"));
}

#[tokio::test]
async fn blank_query_lists_without_tracking() {
    let (store, service) = browse_service();

    let movies = service.browse("   ").await.unwrap();

    assert_eq!(movies.len(), 2);
    assert!(metric_rows(&store).await.is_empty());
}

#[tokio::test]
async fn detail_load_selects_regional_certification() {
    let service = MovieDetailService::new(FixtureCatalog::new(), "https://img.test");

    let summary = service.load(949).await.unwrap();

    assert_eq!(summary.certification.as_deref(), Some("R"));
    assert_eq!(summary.year.as_deref(), Some("1995"));
    assert_eq!(summary.rating, 8);
    assert_eq!(summary.budget_text.as_deref(), Some("$60.0 million"));
    assert_eq!(summary.revenue_text, None);
    assert_eq!(
        summary.companies.as_deref(),
        Some("Regency Enterprises ・ Forward Pass")
    );
    assert_eq!(summary.genres, vec!["Action".to_string(), "Crime".to_string()]);
}

#[tokio::test]
async fn detail_load_honors_configured_region() {
    let service =
        MovieDetailService::new(FixtureCatalog::new(), "https://img.test").with_region("DE");

    let summary = service.load(949).await.unwrap();

    assert_eq!(summary.certification.as_deref(), Some("12"));
}

#[tokio::test]
async fn missing_release_dates_only_lose_the_certification() {
    let catalog = FixtureCatalog {
        release_info: None,
        ..FixtureCatalog::new()
    };
    let service = MovieDetailService::new(catalog, "https://img.test");

    let summary = service.load(949).await.unwrap();

    assert_eq!(summary.certification, None);
    assert_eq!(summary.title.as_deref(), Some("Heat"));
}

#[tokio::test]
async fn unknown_movie_fails_the_detail_load() {
    let service = MovieDetailService::new(FixtureCatalog::new(), "https://img.test");

    let err = service.load(1).await.unwrap_err();

    assert!(matches!(err, CatalogError::NotFound));
}
