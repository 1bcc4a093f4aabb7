//! Saved-movie gateway over the row store.
//!
//! # Responsibility
//! - Create, list, look up and delete saved-movie rows.
//! - Recover from duplicate-save races by returning the existing row.
//!
//! # Invariants
//! - `saved_at` and the row key are assigned here, once, at creation.
//! - A `Conflict` on save is answered with a lookup by `movie_id`; any other
//!   failure propagates unchanged.

use crate::config::AppConfig;
use crate::model::movie::MovieId;
use crate::model::saved::{poster_url, NewSavedRow, RowKey, SavePayload, SavedRow};
use crate::store::{
    timestamp_now, to_row_data, Query, RowStore, StoreResult, TableRef,
};
use log::{info, warn};
use uuid::Uuid;

/// Page size used by list callers that do not pick one.
pub const SAVED_DEFAULT_LIMIT: u32 = 24;

/// Sort modes offered by the saved list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavedSort {
    /// Most recently saved first.
    #[default]
    Recent,
    /// Highest vote average first.
    Rating,
    /// Title A-Z.
    Title,
    /// Newest release first.
    Release,
}

impl SavedSort {
    fn order_query(self) -> Query {
        match self {
            Self::Recent => Query::order_desc("saved_at"),
            Self::Rating => Query::order_desc("vote_average"),
            Self::Title => Query::order_asc("title"),
            Self::Release => Query::order_desc("release_date"),
        }
    }
}

/// Options for one saved-list page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedListOptions {
    /// Defaults to [`SAVED_DEFAULT_LIMIT`].
    pub limit: Option<u32>,
    /// Key of the last row already seen.
    pub cursor_after: Option<RowKey>,
    pub sort: SavedSort,
}

/// One page of saved rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavedPage {
    pub rows: Vec<SavedRow>,
    /// Matching row count when the store reports it.
    pub total: Option<u64>,
}

/// Gateway for the saved-movies table.
#[derive(Debug)]
pub struct SavedRowGateway<S> {
    store: S,
    table: TableRef,
    image_base_url: String,
}

impl<S: RowStore> SavedRowGateway<S> {
    pub fn new(store: S, table: TableRef, image_base_url: impl Into<String>) -> Self {
        Self {
            store,
            table,
            image_base_url: image_base_url.into(),
        }
    }

    /// Addresses the saved table named in `config`.
    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            TableRef::new(&config.store.database_id, &config.store.saved_table_id),
            &config.metadata.image_base_url,
        )
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Saves a movie, returning the created row or the row that already
    /// exists for the same `movie_id`.
    pub async fn save(&self, payload: &SavePayload) -> StoreResult<SavedRow> {
        let record = NewSavedRow {
            movie_id: payload.id,
            saved_at: timestamp_now(),
            title: payload.title.clone(),
            poster_url: poster_url(&self.image_base_url, payload.poster_path.as_deref()),
            vote_average: payload.vote_average,
            popularity: payload.popularity,
            release_date: payload.release_date.clone(),
            genre_ids: payload.genre_ids.clone().unwrap_or_default(),
        };
        let key = new_row_key();

        match self
            .store
            .create_row(&self.table, &key, to_row_data(&record)?)
            .await
        {
            Ok(row) => {
                info!(
                    "event=movie_save module=repo status=ok movie_id={} row_key={key}",
                    payload.id
                );
                row.decode()
            }
            Err(err) if err.is_conflict() => {
                info!(
                    "event=movie_save module=repo status=conflict movie_id={} action=lookup_existing",
                    payload.id
                );
                match self.get_by_movie_id(payload.id).await? {
                    Some(existing) => Ok(existing),
                    None => {
                        warn!(
                            "event=movie_save module=repo status=error movie_id={} error_code=conflict_without_row",
                            payload.id
                        );
                        Err(err)
                    }
                }
            }
            Err(err) => {
                warn!(
                    "event=movie_save module=repo status=error movie_id={} error_code={}",
                    payload.id, err.kind
                );
                Err(err)
            }
        }
    }

    /// Lists one page of saved rows in the requested order.
    pub async fn list_saved(&self, options: &SavedListOptions) -> StoreResult<SavedPage> {
        let mut queries = vec![
            Query::Limit(options.limit.unwrap_or(SAVED_DEFAULT_LIMIT)),
            options.sort.order_query(),
        ];
        if let Some(cursor) = &options.cursor_after {
            queries.push(Query::cursor_after(cursor.as_str()));
        }

        let list = self.store.list_rows(&self.table, &queries).await?;
        let rows = list
            .rows
            .iter()
            .map(|row| row.decode())
            .collect::<StoreResult<Vec<SavedRow>>>()?;
        Ok(SavedPage {
            rows,
            total: list.total,
        })
    }

    /// Returns the saved row for `movie_id`, if any.
    pub async fn get_by_movie_id(&self, movie_id: MovieId) -> StoreResult<Option<SavedRow>> {
        let list = self
            .store
            .list_rows(
                &self.table,
                &[Query::equal("movie_id", movie_id), Query::Limit(1)],
            )
            .await?;
        list.rows.first().map(|row| row.decode()).transpose()
    }

    /// Returns the key of the saved row for `movie_id`, if any.
    pub async fn is_saved(&self, movie_id: MovieId) -> StoreResult<Option<RowKey>> {
        Ok(self.get_by_movie_id(movie_id).await?.map(|row| row.key))
    }

    /// Deletes a saved row by key.
    ///
    /// Deleting a key that no longer exists yields the store's `NotFound`.
    pub async fn delete_saved(&self, key: &str) -> StoreResult<()> {
        self.store.delete_row(&self.table, key).await?;
        info!("event=movie_unsave module=repo status=ok row_key={key}");
        Ok(())
    }
}

/// Generates a store-compatible unique row key.
pub fn new_row_key() -> RowKey {
    Uuid::new_v4().simple().to_string()
}
