//! Saved-list controller: paginated local view of saved rows.
//!
//! # Responsibility
//! - Hold rows, cursor, has-more and loading state for one list view.
//! - Issue refresh (replace) and load-more (append) fetches.
//! - Drop rows locally only after the remote delete is confirmed.
//!
//! # Invariants
//! - `load_more` is a no-op while loading or when `has_more` is false.
//! - `refresh` is never blocked; it bumps a generation counter and any
//!   completion from an older generation is discarded.
//! - A failed fetch leaves rows untouched and clears `loading`.
//! - The cursor always names a row still held locally, or is `None`.

use crate::model::saved::{RowKey, SavedRow};
use crate::repo::saved_gateway::{SavedListOptions, SavedRowGateway, SavedSort, SAVED_DEFAULT_LIMIT};
use crate::store::{RowStore, StoreResult};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle notifications delivered by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The list view regained user focus.
    BecameActive,
}

/// Result of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied to local state.
    Applied { fetched: usize },
    /// Nothing was requested (already loading or no more pages).
    Skipped,
    /// A newer refresh started before this fetch completed; its result was
    /// discarded.
    Superseded,
}

/// Copy of the controller state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedListSnapshot {
    pub rows: Vec<SavedRow>,
    pub cursor: Option<RowKey>,
    pub has_more: bool,
    pub loading: bool,
    /// Message of the last failed fetch; cleared by the next success.
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct ListState {
    rows: Vec<SavedRow>,
    cursor: Option<RowKey>,
    has_more: bool,
    loading: bool,
    last_error: Option<String>,
    generation: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            cursor: None,
            has_more: true,
            loading: false,
            last_error: None,
            generation: 0,
        }
    }
}

/// Paginated saved-list state for one view.
pub struct SavedListController<S> {
    gateway: Arc<SavedRowGateway<S>>,
    page_size: u32,
    sort: SavedSort,
    state: Mutex<ListState>,
}

impl<S: RowStore> SavedListController<S> {
    pub fn new(gateway: Arc<SavedRowGateway<S>>) -> Self {
        Self {
            gateway,
            page_size: SAVED_DEFAULT_LIMIT,
            sort: SavedSort::default(),
            state: Mutex::new(ListState::default()),
        }
    }

    /// Page size used for the full-page heuristic; zero is treated as one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_sort(mut self, sort: SavedSort) -> Self {
        self.sort = sort;
        self
    }

    pub async fn snapshot(&self) -> SavedListSnapshot {
        let state = self.state.lock().await;
        SavedListSnapshot {
            rows: state.rows.clone(),
            cursor: state.cursor.clone(),
            has_more: state.has_more,
            loading: state.loading,
            last_error: state.last_error.clone(),
        }
    }

    /// Reacts to a host lifecycle event.
    pub async fn handle_event(&self, event: HostEvent) -> StoreResult<LoadOutcome> {
        match event {
            HostEvent::BecameActive => {
                debug!("event=saved_list_focus module=service status=start");
                self.refresh().await
            }
        }
    }

    /// Replaces local rows with the first page.
    pub async fn refresh(&self) -> StoreResult<LoadOutcome> {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let result = self.fetch_page(None).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(rows) => {
                let fetched = rows.len();
                state.has_more = self.is_full_page(fetched);
                state.cursor = rows.last().map(|row| row.key.clone());
                state.rows = rows;
                state.last_error = None;
                debug!(
                    "event=saved_list_refresh module=service status=ok fetched={fetched} has_more={}",
                    state.has_more
                );
                Ok(LoadOutcome::Applied { fetched })
            }
            Err(err) => {
                warn!(
                    "event=saved_list_refresh module=service status=error error_code={} error={err}",
                    err.kind
                );
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Appends the next page after the stored cursor.
    pub async fn load_more(&self) -> StoreResult<LoadOutcome> {
        let (generation, cursor) = {
            let mut state = self.state.lock().await;
            if !state.has_more || state.loading {
                return Ok(LoadOutcome::Skipped);
            }
            state.loading = true;
            (state.generation, state.cursor.clone())
        };

        let result = self.fetch_page(cursor).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("event=saved_list_load_more module=service status=superseded");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(rows) => {
                let fetched = rows.len();
                state.has_more = self.is_full_page(fetched);
                if let Some(last) = rows.last() {
                    state.cursor = Some(last.key.clone());
                }
                state.rows.extend(rows);
                state.last_error = None;
                debug!(
                    "event=saved_list_load_more module=service status=ok fetched={fetched} has_more={}",
                    state.has_more
                );
                Ok(LoadOutcome::Applied { fetched })
            }
            Err(err) => {
                warn!(
                    "event=saved_list_load_more module=service status=error error_code={} error={err}",
                    err.kind
                );
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Drops a row that was already deleted remotely.
    ///
    /// Returns whether a row was removed; an unknown key is a no-op.
    /// Removing the cursor row moves the cursor back to the new last row.
    pub async fn handle_removed(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        let before = state.rows.len();
        state.rows.retain(|row| row.key != key);
        if state.cursor.as_deref() == Some(key) {
            state.cursor = state.rows.last().map(|row| row.key.clone());
        }
        before != state.rows.len()
    }

    /// Deletes a row remotely, then removes it locally.
    ///
    /// Local state is untouched when the remote delete fails.
    pub async fn remove_saved(&self, key: &str) -> StoreResult<()> {
        self.gateway.delete_saved(key).await?;
        self.handle_removed(key).await;
        Ok(())
    }

    async fn fetch_page(&self, cursor_after: Option<RowKey>) -> StoreResult<Vec<SavedRow>> {
        let options = SavedListOptions {
            limit: Some(self.page_size),
            cursor_after,
            sort: self.sort,
        };
        Ok(self.gateway.list_saved(&options).await?.rows)
    }

    fn is_full_page(&self, fetched: usize) -> bool {
        fetched >= self.page_size as usize
    }
}
