//! Explicit runtime configuration for remote collaborators.
//!
//! # Responsibility
//! - Describe metadata-provider and row-store settings as plain structs.
//! - Load settings from process environment in one place, at startup.
//!
//! # Invariants
//! - Clients receive configuration through constructors, never from globals.
//! - Required keys are validated here; optional keys fall back to defaults.
//! - The metadata API key is not validated beyond presence of the variable.

use thiserror::Error;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_LANGUAGE: &str = "en-US";

const ENV_PREFIX: &str = "MOVIESHELF_";

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("missing required configuration `{0}`")]
    Missing(String),
    /// A variable is present but unusable.
    #[error("invalid configuration `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

/// Settings for the movie metadata HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    /// API root without trailing slash, e.g. `https://api.themoviedb.org/3`.
    pub base_url: String,
    /// Bearer token sent on every request.
    pub api_key: String,
    /// Poster CDN prefix; relative poster paths are appended verbatim.
    pub image_base_url: String,
    /// Language used for top-rated listings.
    pub language: String,
}

impl MetadataConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            api_key: api_key.into(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Settings for the hosted row store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// REST endpoint root, e.g. `https://cloud.appwrite.io/v1`.
    pub endpoint: String,
    pub project_id: String,
    /// Server key; mobile clients usually run without one.
    pub api_key: Option<String>,
    pub database_id: String,
    /// Table holding saved-movie rows.
    pub saved_table_id: String,
    /// Table holding per-search-term counters.
    pub search_table_id: String,
}

/// Full application configuration handed to client constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub metadata: MetadataConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads `MOVIESHELF_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Keys are the unprefixed names (`TMDB_API_KEY`, `STORE_ENDPOINT`, ...);
    /// the lookup receives them with the `MOVIESHELF_` prefix applied.
    ///
    /// # Errors
    /// - `Missing` when a required key is absent or blank.
    /// - `Invalid` when a URL setting does not use http(s).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<String> {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &str| -> Result<String, ConfigError> {
            get(name).ok_or_else(|| ConfigError::Missing(format!("{ENV_PREFIX}{name}")))
        };

        let metadata = MetadataConfig {
            base_url: normalize_url(
                "TMDB_BASE_URL",
                get("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
            )?,
            // Absent token is tolerated; requests then fail remotely.
            api_key: get("TMDB_API_KEY").unwrap_or_default(),
            image_base_url: get("IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
            language: get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        };

        let store = StoreConfig {
            endpoint: normalize_url("STORE_ENDPOINT", require("STORE_ENDPOINT")?)?,
            project_id: require("STORE_PROJECT_ID")?,
            api_key: get("STORE_API_KEY"),
            database_id: require("STORE_DATABASE_ID")?,
            saved_table_id: require("STORE_SAVED_TABLE_ID")?,
            search_table_id: require("STORE_SEARCH_TABLE_ID")?,
        };

        Ok(Self { metadata, store })
    }
}

fn normalize_url(name: &str, value: String) -> Result<String, ConfigError> {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(ConfigError::Invalid {
            key: format!("{ENV_PREFIX}{name}"),
            reason: format!("expected an http(s) URL, got `{value}`"),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
