//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose browse, detail, save and saved-list use cases to Dart via FRB.
//! - Own the process-wide runtime and service graph built by `configure`.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Failures are reported inside response envelopes, never thrown.
//! - Calls made before `configure` fail with a "not configured" message.

use log::warn;
use movieshelf_core::config::{MetadataConfig, DEFAULT_IMAGE_BASE_URL};
use movieshelf_core::db::SqliteRowStore;
use movieshelf_core::repo::saved_gateway::SavedRowGateway;
use movieshelf_core::repo::search_metrics::SearchMetricsGateway;
use movieshelf_core::service::browse::BrowseService;
use movieshelf_core::service::movie_detail::{MovieDetailService, MovieDetailSummary};
use movieshelf_core::service::saved_list::{HostEvent, SavedListController, SavedListSnapshot};
use movieshelf_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, AppwriteRowStore, Movie, MovieCatalog, RowStore, SavePayload, SavedRow,
    TableRef, TmdbClient,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Runtime;

const LOCAL_DATABASE_ID: &str = "local";
const LOCAL_SAVED_TABLE_ID: &str = "saved_movies";
const LOCAL_SEARCH_TABLE_ID: &str = "search_metrics";
const NOT_CONFIGURED: &str = "movieshelf is not configured; call configure first";

type SharedStore = Arc<dyn RowStore>;
type SharedCatalog = Arc<dyn MovieCatalog>;

static CONTEXT: Lazy<RwLock<Option<Arc<ShelfContext>>>> = Lazy::new(|| RwLock::new(None));

/// Runtime plus the service graph every call runs against.
struct ShelfContext {
    runtime: Runtime,
    browse: BrowseService<SharedCatalog, SharedStore>,
    detail: MovieDetailService<SharedCatalog>,
    saved: Arc<SavedRowGateway<SharedStore>>,
    saved_list: SavedListController<SharedStore>,
}

impl ShelfContext {
    fn build(
        catalog: SharedCatalog,
        store: SharedStore,
        saved_table: TableRef,
        search_table: TableRef,
        image_base_url: &str,
    ) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("movieshelf-io")
            .enable_all()
            .build()
            .map_err(|err| format!("runtime start failed: {err}"))?;
        let saved = Arc::new(SavedRowGateway::new(
            Arc::clone(&store),
            saved_table,
            image_base_url,
        ));
        let metrics = SearchMetricsGateway::new(store, search_table, image_base_url);

        Ok(Self {
            runtime,
            browse: BrowseService::new(Arc::clone(&catalog)).with_metrics(metrics),
            detail: MovieDetailService::new(catalog, image_base_url),
            saved_list: SavedListController::new(Arc::clone(&saved)),
            saved,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to repeat with the same arguments.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Connects the app to the hosted row store and the metadata API.
///
/// Blank optional values fall back to defaults. Calling again replaces the
/// active configuration; the saved list starts empty afterwards.
///
/// # FFI contract
/// - Returns empty string on success and error message on failure.
/// - On failure the previous configuration stays active.
#[allow(clippy::too_many_arguments)]
pub fn configure(
    tmdb_api_key: String,
    store_endpoint: String,
    store_project_id: String,
    store_api_key: Option<String>,
    database_id: String,
    saved_table_id: String,
    search_table_id: String,
    image_base_url: Option<String>,
) -> String {
    let mut values = HashMap::from([
        ("MOVIESHELF_TMDB_API_KEY", tmdb_api_key),
        ("MOVIESHELF_STORE_ENDPOINT", store_endpoint),
        ("MOVIESHELF_STORE_PROJECT_ID", store_project_id),
        ("MOVIESHELF_STORE_DATABASE_ID", database_id),
        ("MOVIESHELF_STORE_SAVED_TABLE_ID", saved_table_id),
        ("MOVIESHELF_STORE_SEARCH_TABLE_ID", search_table_id),
    ]);
    if let Some(key) = store_api_key {
        values.insert("MOVIESHELF_STORE_API_KEY", key);
    }
    if let Some(url) = image_base_url {
        values.insert("MOVIESHELF_IMAGE_BASE_URL", url);
    }

    let result = AppConfig::from_lookup(|key| values.get(key).cloned())
        .map_err(|err| err.to_string())
        .and_then(|config| {
            let store = AppwriteRowStore::new(&config.store).map_err(|err| err.to_string())?;
            let catalog =
                TmdbClient::new(config.metadata.clone()).map_err(|err| err.to_string())?;
            ShelfContext::build(
                Arc::new(catalog),
                Arc::new(store),
                TableRef::new(&config.store.database_id, &config.store.saved_table_id),
                TableRef::new(&config.store.database_id, &config.store.search_table_id),
                &config.metadata.image_base_url,
            )
        });
    install_context("configure", result)
}

/// Uses an on-device SQLite file as the row store.
///
/// Intended for local development without a hosted project. The saved
/// table gets a unique index on `movie_id`.
pub fn configure_local(db_path: String, tmdb_api_key: String) -> String {
    let result = SqliteRowStore::open(db_path.trim())
        .map_err(|err| format!("local store open failed: {err}"))
        .and_then(|store| {
            let saved_table = TableRef::new(LOCAL_DATABASE_ID, LOCAL_SAVED_TABLE_ID);
            store
                .ensure_unique_index(&saved_table, "movie_id")
                .map_err(|err| err.to_string())?;
            let catalog = TmdbClient::new(MetadataConfig::new(tmdb_api_key.trim()))
                .map_err(|err| err.to_string())?;
            ShelfContext::build(
                Arc::new(catalog),
                Arc::new(store),
                saved_table,
                TableRef::new(LOCAL_DATABASE_ID, LOCAL_SEARCH_TABLE_ID),
                DEFAULT_IMAGE_BASE_URL,
            )
        });
    install_context("configure_local", result)
}

/// Movie list item.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieItem {
    pub movie_id: i64,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    pub genre_ids: Vec<i64>,
}

/// Browse/search response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResponse {
    pub ok: bool,
    pub items: Vec<MovieItem>,
    pub message: String,
}

/// Lists top-rated movies for a blank query, search results otherwise.
pub fn browse_movies(query: String) -> BrowseResponse {
    match with_context(|ctx| browse_in(ctx, &query)) {
        Ok(items) => BrowseResponse {
            ok: true,
            message: format!("Found {} movie(s).", items.len()),
            items,
        },
        Err(message) => BrowseResponse {
            ok: false,
            items: Vec::new(),
            message: failure("browse_movies", message),
        },
    }
}

/// Display-ready movie detail.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailView {
    pub movie_id: i64,
    pub title: Option<String>,
    pub year: Option<String>,
    pub certification: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub rating: u8,
    pub vote_count: u64,
    pub popularity: u64,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub budget_text: Option<String>,
    pub revenue_text: Option<String>,
    pub countries: Option<String>,
    pub companies: Option<String>,
    pub poster_url: Option<String>,
}

/// Movie detail response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailResponse {
    pub ok: bool,
    pub detail: Option<MovieDetailView>,
    pub message: String,
}

/// Loads the detail projection, including the US certification.
pub fn movie_detail(movie_id: i64) -> MovieDetailResponse {
    match with_context(|ctx| {
        ctx.block_on(ctx.detail.load(movie_id))
            .map_err(|err| err.to_string())
    }) {
        Ok(summary) => MovieDetailResponse {
            ok: true,
            detail: Some(to_detail_view(summary)),
            message: "Loaded.".to_string(),
        },
        Err(message) => MovieDetailResponse {
            ok: false,
            detail: None,
            message: failure("movie_detail", message),
        },
    }
}

/// Save/unsave response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfActionResponse {
    pub ok: bool,
    /// Row key of the saved row, when one exists after the call.
    pub row_key: Option<String>,
    pub message: String,
}

impl ShelfActionResponse {
    fn success(message: impl Into<String>, row_key: Option<String>) -> Self {
        Self {
            ok: true,
            row_key,
            message: message.into(),
        }
    }

    fn failure(operation: &str, message: String) -> Self {
        Self {
            ok: false,
            row_key: None,
            message: failure(operation, message),
        }
    }
}

/// Saves a movie; saving an already saved movie returns the existing row.
#[allow(clippy::too_many_arguments)]
pub fn save_movie(
    movie_id: i64,
    title: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    release_date: Option<String>,
    genre_ids: Option<Vec<i64>>,
) -> ShelfActionResponse {
    let payload = SavePayload {
        id: movie_id,
        title,
        poster_path,
        vote_average,
        popularity,
        release_date,
        genre_ids,
    };
    match with_context(|ctx| {
        ctx.block_on(ctx.saved.save(&payload))
            .map_err(|err| err.to_string())
    }) {
        Ok(row) => ShelfActionResponse::success("Saved.", Some(row.key)),
        Err(message) => ShelfActionResponse::failure("save_movie", message),
    }
}

/// Deletes a saved row and drops it from the saved list.
pub fn unsave_movie(row_key: String) -> ShelfActionResponse {
    match with_context(|ctx| {
        ctx.block_on(async {
            ctx.saved.delete_saved(&row_key).await?;
            ctx.saved_list.handle_removed(&row_key).await;
            Ok::<_, movieshelf_core::StoreError>(())
        })
        .map_err(|err| err.to_string())
    }) {
        Ok(()) => ShelfActionResponse::success("Removed.", None),
        Err(message) => ShelfActionResponse::failure("unsave_movie", message),
    }
}

/// Looks up whether a movie is saved; `row_key` is set when it is.
pub fn movie_saved_key(movie_id: i64) -> ShelfActionResponse {
    match with_context(|ctx| {
        ctx.block_on(ctx.saved.is_saved(movie_id))
            .map_err(|err| err.to_string())
    }) {
        Ok(key) => ShelfActionResponse::success("Checked.", key),
        Err(message) => ShelfActionResponse::failure("movie_saved_key", message),
    }
}

/// Saved list item.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedItem {
    pub row_key: String,
    pub movie_id: i64,
    pub saved_at: String,
    pub title: Option<String>,
    pub poster_url: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    pub genre_ids: Vec<i64>,
}

/// Saved list state after a call.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedListResponse {
    pub ok: bool,
    pub items: Vec<SavedItem>,
    pub has_more: bool,
    pub loading: bool,
    pub message: String,
}

/// Replaces the saved list with its first page.
pub fn saved_list_refresh() -> SavedListResponse {
    saved_list_call("saved_list_refresh", |ctx| async move {
        ctx.saved_list.refresh().await.map(|_| ())
    })
}

/// Appends the next saved page; no-op while loading or at the end.
pub fn saved_list_load_more() -> SavedListResponse {
    saved_list_call("saved_list_load_more", |ctx| async move {
        ctx.saved_list.load_more().await.map(|_| ())
    })
}

/// Deletes a row remotely, then removes it from the list.
pub fn saved_list_remove(row_key: String) -> SavedListResponse {
    saved_list_call("saved_list_remove", |ctx| async move {
        ctx.saved_list.remove_saved(&row_key).await
    })
}

/// Host notification that the saved list regained focus.
pub fn saved_list_became_active() -> SavedListResponse {
    saved_list_call("saved_list_became_active", |ctx| async move {
        ctx.saved_list
            .handle_event(HostEvent::BecameActive)
            .await
            .map(|_| ())
    })
}

/// Current saved list state without fetching.
pub fn saved_list_snapshot() -> SavedListResponse {
    saved_list_call("saved_list_snapshot", |_| async { Ok(()) })
}

fn saved_list_call<F, Fut>(operation: &str, action: F) -> SavedListResponse
where
    F: FnOnce(Arc<ShelfContext>) -> Fut,
    Fut: Future<Output = movieshelf_core::StoreResult<()>>,
{
    let ctx = match current_context() {
        Ok(ctx) => ctx,
        Err(message) => return to_saved_list_response(None, Err(failure(operation, message))),
    };
    let outcome = ctx.block_on(action(Arc::clone(&ctx)));
    let snapshot = ctx.block_on(ctx.saved_list.snapshot());
    to_saved_list_response(
        Some(snapshot),
        outcome.map_err(|err| failure(operation, err.to_string())),
    )
}

fn to_saved_list_response(
    snapshot: Option<SavedListSnapshot>,
    outcome: Result<(), String>,
) -> SavedListResponse {
    let (items, has_more, loading) = match snapshot {
        Some(snapshot) => (
            snapshot.rows.into_iter().map(to_saved_item).collect(),
            snapshot.has_more,
            snapshot.loading,
        ),
        None => (Vec::new(), false, false),
    };
    match outcome {
        Ok(()) => SavedListResponse {
            ok: true,
            message: format!("{} saved movie(s).", items.len()),
            items,
            has_more,
            loading,
        },
        Err(message) => SavedListResponse {
            ok: false,
            items,
            has_more,
            loading,
            message,
        },
    }
}

fn browse_in(ctx: &ShelfContext, query: &str) -> Result<Vec<MovieItem>, String> {
    ctx.block_on(ctx.browse.browse(query))
        .map(|movies| movies.into_iter().map(to_movie_item).collect())
        .map_err(|err| err.to_string())
}

fn install_context(operation: &str, result: Result<ShelfContext, String>) -> String {
    match result {
        Ok(ctx) => {
            let previous = {
                let mut slot = CONTEXT.write().unwrap_or_else(PoisonError::into_inner);
                slot.replace(Arc::new(ctx))
            };
            // Released outside the write lock.
            drop(previous);
            String::new()
        }
        Err(message) => failure(operation, message),
    }
}

fn current_context() -> Result<Arc<ShelfContext>, String> {
    CONTEXT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| NOT_CONFIGURED.to_string())
}

fn with_context<T>(f: impl FnOnce(&ShelfContext) -> Result<T, String>) -> Result<T, String> {
    let ctx = current_context()?;
    f(&ctx)
}

fn failure(operation: &str, message: String) -> String {
    warn!("event=ffi_call module=ffi status=error op={operation} error={message}");
    format!("{operation} failed: {message}")
}

fn to_movie_item(movie: Movie) -> MovieItem {
    MovieItem {
        movie_id: movie.id,
        title: movie.title,
        poster_path: movie.poster_path,
        vote_average: movie.vote_average,
        popularity: movie.popularity,
        release_date: movie.release_date,
        genre_ids: movie.genre_ids,
    }
}

fn to_saved_item(row: SavedRow) -> SavedItem {
    SavedItem {
        row_key: row.key,
        movie_id: row.movie_id,
        saved_at: row.saved_at,
        title: row.title,
        poster_url: row.poster_url,
        vote_average: row.vote_average,
        popularity: row.popularity,
        release_date: row.release_date,
        genre_ids: row.genre_ids,
    }
}

fn to_detail_view(summary: MovieDetailSummary) -> MovieDetailView {
    MovieDetailView {
        movie_id: summary.movie_id,
        title: summary.title,
        year: summary.year,
        certification: summary.certification,
        runtime_minutes: summary.runtime_minutes,
        rating: summary.rating,
        vote_count: summary.vote_count,
        popularity: summary.popularity,
        overview: summary.overview,
        status: summary.status,
        genres: summary.genres,
        budget_text: summary.budget_text,
        revenue_text: summary.revenue_text,
        countries: summary.countries,
        companies: summary.companies,
        poster_url: summary.poster_url,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        browse_in, configure, core_version, init_logging, ping, to_saved_list_response,
        ShelfContext,
    };
    use async_trait::async_trait;
    use movieshelf_core::metadata::{CatalogError, CatalogResult, MovieCatalog};
    use movieshelf_core::model::movie::{Movie, MovieDetails, MovieId};
    use movieshelf_core::model::release::ReleaseInfo;
    use movieshelf_core::model::search_metric::SearchMetric;
    use movieshelf_core::{Query, RowStore, SavePayload, SqliteRowStore, TableRef};
    use std::sync::Arc;

    struct OneMovieCatalog;

    #[async_trait]
    impl MovieCatalog for OneMovieCatalog {
        async fn fetch_movies(&self, _query: &str) -> CatalogResult<Vec<Movie>> {
            serde_json::from_str(r#"[{"id":603,"title":"The Matrix","poster_path":"/m.jpg"}]"#)
                .map_err(|err| CatalogError::Parse(err.to_string()))
        }

        async fn fetch_movie_details(&self, _movie_id: MovieId) -> CatalogResult<MovieDetails> {
            Err(CatalogError::NotFound)
        }

        async fn fetch_release_info(&self, _movie_id: MovieId) -> CatalogResult<ReleaseInfo> {
            Err(CatalogError::NotFound)
        }
    }

    fn local_context() -> (ShelfContext, Arc<SqliteRowStore>) {
        let store = Arc::new(SqliteRowStore::open_in_memory().unwrap());
        let saved_table = TableRef::new("local", "saved");
        store.ensure_unique_index(&saved_table, "movie_id").unwrap();
        let ctx = ShelfContext::build(
            Arc::new(OneMovieCatalog),
            Arc::clone(&store) as Arc<dyn RowStore>,
            saved_table,
            TableRef::new("local", "metrics"),
            "https://img.test",
        )
        .unwrap();
        (ctx, store)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn configure_rejects_missing_required_values() {
        let error = configure(
            "token".to_string(),
            "https://store.test/v1".to_string(),
            "  ".to_string(),
            None,
            "db".to_string(),
            "saved".to_string(),
            "metrics".to_string(),
            None,
        );
        assert!(error.contains("MOVIESHELF_STORE_PROJECT_ID"), "{error}");
    }

    #[test]
    fn configure_rejects_non_http_endpoint() {
        let error = configure(
            "token".to_string(),
            "store.test".to_string(),
            "project".to_string(),
            None,
            "db".to_string(),
            "saved".to_string(),
            "metrics".to_string(),
            None,
        );
        assert!(error.contains("MOVIESHELF_STORE_ENDPOINT"), "{error}");
    }

    #[test]
    fn browse_maps_movies_and_records_search() {
        let (ctx, store) = local_context();

        let items = browse_in(&ctx, "matrix").unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].movie_id, 603);
        assert_eq!(items[0].poster_path.as_deref(), Some("/m.jpg"));

        let rows = ctx
            .block_on(store.list_rows(&TableRef::new("local", "metrics"), &[Query::Limit(10)]))
            .unwrap()
            .rows;
        assert_eq!(rows.len(), 1);
        let metric: SearchMetric = rows[0].decode().unwrap();
        assert_eq!(metric.search_term, "matrix");
        assert_eq!(metric.count, 1);
        assert_eq!(metric.movie_id, 603);
    }

    #[test]
    fn saved_list_reflects_saves_and_removals() {
        let (ctx, _store) = local_context();
        let payload = SavePayload {
            popularity: Some(83.1),
            genre_ids: Some(vec![28, 878]),
            ..SavePayload::new(603)
        };
        let row = ctx.block_on(ctx.saved.save(&payload)).unwrap();

        ctx.block_on(ctx.saved_list.refresh()).unwrap();
        let response = to_saved_list_response(Some(ctx.block_on(ctx.saved_list.snapshot())), Ok(()));
        assert!(response.ok);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].row_key, row.key);
        assert_eq!(response.items[0].popularity, Some(83.1));
        assert_eq!(response.items[0].genre_ids, vec![28, 878]);
        assert!(!response.has_more);

        ctx.block_on(ctx.saved_list.remove_saved(&row.key)).unwrap();
        assert!(ctx.block_on(ctx.saved_list.snapshot()).rows.is_empty());
    }

    #[test]
    fn failed_list_call_keeps_items_and_reports_message() {
        let (ctx, _store) = local_context();
        ctx.block_on(ctx.saved.save(&SavePayload::new(1))).unwrap();
        ctx.block_on(ctx.saved_list.refresh()).unwrap();

        let response = to_saved_list_response(
            Some(ctx.block_on(ctx.saved_list.snapshot())),
            Err("saved_list_remove failed: gone".to_string()),
        );

        assert!(!response.ok);
        assert_eq!(response.items.len(), 1);
        assert!(response.message.contains("gone"));
    }
}
