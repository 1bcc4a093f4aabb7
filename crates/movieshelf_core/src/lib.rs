//! Core domain logic for MovieShelf.
//! Saved-movie rows, paginated saved lists, movie metadata and
//! certification selection live here; host bindings stay thin.

pub mod certification;
pub mod config;
pub mod db;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use certification::{select_certification, select_default_certification, DEFAULT_REGION};
pub use config::{AppConfig, ConfigError, MetadataConfig, StoreConfig};
pub use db::SqliteRowStore;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use metadata::{CatalogError, CatalogResult, MovieCatalog, TmdbClient};
pub use model::movie::{Movie, MovieDetails, MovieId};
pub use model::release::{ReleaseInfo, ReleaseType};
pub use model::saved::{RowKey, SavePayload, SavedRow};
pub use repo::saved_gateway::{SavedListOptions, SavedPage, SavedRowGateway, SavedSort};
pub use repo::search_metrics::SearchMetricsGateway;
pub use service::browse::BrowseService;
pub use service::movie_detail::{MovieDetailService, MovieDetailSummary};
pub use service::save_toggle::{SaveToggle, ToggleOutcome};
pub use service::saved_list::{HostEvent, LoadOutcome, SavedListController, SavedListSnapshot};
pub use store::{
    AppwriteRowStore, Query, Row, RowList, RowStore, StoreError, StoreErrorKind, StoreResult,
    TableRef,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
