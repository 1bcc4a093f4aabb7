//! Save/unsave toggle for one movie detail view.
//!
//! # Invariants
//! - At most one save or unsave request is in flight per toggle.
//! - After `detach`, completions no longer touch state.
//! - An unsave that finds the row already gone counts as unsaved.

use crate::model::saved::{RowKey, SavePayload};
use crate::repo::saved_gateway::SavedRowGateway;
use crate::store::{RowStore, StoreResult};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Saved-status lookup applied.
    Checked { saved: bool },
    Saved(RowKey),
    Unsaved,
    /// A request was already in flight; nothing was sent.
    Busy,
    /// The view went away before the response arrived.
    Detached,
}

#[derive(Debug, Default)]
struct ToggleState {
    saved_key: Option<RowKey>,
    busy: bool,
    detached: bool,
}

pub struct SaveToggle<S> {
    gateway: Arc<SavedRowGateway<S>>,
    payload: SavePayload,
    state: Mutex<ToggleState>,
}

impl<S: RowStore> SaveToggle<S> {
    pub fn new(gateway: Arc<SavedRowGateway<S>>, payload: SavePayload) -> Self {
        Self {
            gateway,
            payload,
            state: Mutex::new(ToggleState::default()),
        }
    }

    /// Key of the saved row as last observed, if saved.
    pub async fn saved_key(&self) -> Option<RowKey> {
        self.state.lock().await.saved_key.clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.state.lock().await.busy
    }

    /// Marks the owning view as gone.
    pub async fn detach(&self) {
        self.state.lock().await.detached = true;
    }

    /// Loads whether the movie is currently saved.
    pub async fn check(&self) -> StoreResult<ToggleOutcome> {
        let key = self.gateway.is_saved(self.payload.id).await?;

        let mut state = self.state.lock().await;
        if state.detached {
            debug!(
                "event=save_toggle module=service status=dropped action=check movie_id={}",
                self.payload.id
            );
            return Ok(ToggleOutcome::Detached);
        }
        let saved = key.is_some();
        state.saved_key = key;
        Ok(ToggleOutcome::Checked { saved })
    }

    /// Saves when unsaved, unsaves when saved.
    pub async fn toggle(&self) -> StoreResult<ToggleOutcome> {
        let current = {
            let mut state = self.state.lock().await;
            if state.busy {
                return Ok(ToggleOutcome::Busy);
            }
            state.busy = true;
            state.saved_key.clone()
        };

        let result = match &current {
            Some(key) => match self.gateway.delete_saved(key).await {
                Ok(()) => Ok(None),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            },
            None => self.gateway.save(&self.payload).await.map(|row| Some(row.key)),
        };

        let mut state = self.state.lock().await;
        state.busy = false;
        let key = result?;
        if state.detached {
            return Ok(ToggleOutcome::Detached);
        }
        state.saved_key = key.clone();
        info!(
            "event=save_toggle module=service status=ok movie_id={} saved={}",
            self.payload.id,
            key.is_some()
        );
        Ok(match key {
            Some(key) => ToggleOutcome::Saved(key),
            None => ToggleOutcome::Unsaved,
        })
    }
}
