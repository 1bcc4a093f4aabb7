//! Search-term counters.
//!
//! One row per search term; repeated searches bump `count`. The
//! read-then-write sequence is not atomic, so concurrent searches for the
//! same term may lose an increment.

use super::saved_gateway::new_row_key;
use crate::config::AppConfig;
use crate::model::movie::Movie;
use crate::model::saved::poster_url;
use crate::model::search_metric::{NewSearchMetric, SearchMetric};
use crate::store::{to_row_data, Query, RowStore, StoreResult, TableRef};
use log::debug;
use serde_json::{Map, Value};

#[derive(Debug)]
pub struct SearchMetricsGateway<S> {
    store: S,
    table: TableRef,
    image_base_url: String,
}

impl<S: RowStore> SearchMetricsGateway<S> {
    pub fn new(store: S, table: TableRef, image_base_url: impl Into<String>) -> Self {
        Self {
            store,
            table,
            image_base_url: image_base_url.into(),
        }
    }

    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            TableRef::new(&config.store.database_id, &config.store.search_table_id),
            &config.metadata.image_base_url,
        )
    }

    /// Records that `term` was searched and `movie` was its top result.
    pub async fn record_search(&self, term: &str, movie: &Movie) -> StoreResult<SearchMetric> {
        let existing = self
            .store
            .list_rows(&self.table, &[Query::equal("searchTerm", term)])
            .await?;

        if let Some(row) = existing.rows.first() {
            let metric: SearchMetric = row.decode()?;
            let mut data = Map::new();
            data.insert("count".to_string(), Value::from(metric.count + 1));
            let updated = self.store.update_row(&self.table, &row.id, data).await?;
            debug!(
                "event=search_metric module=repo status=ok action=increment count={}",
                metric.count + 1
            );
            return updated.decode();
        }

        let record = NewSearchMetric {
            search_term: term.to_string(),
            movie_id: movie.id,
            title: movie.title.clone(),
            count: 1,
            poster_url: poster_url(&self.image_base_url, movie.poster_path.as_deref()),
        };
        let created = self
            .store
            .create_row(&self.table, &new_row_key(), to_row_data(&record)?)
            .await?;
        debug!("event=search_metric module=repo status=ok action=create");
        created.decode()
    }
}
