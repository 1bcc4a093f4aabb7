//! Hosted row-store backend over the Appwrite TablesDB REST API.
//!
//! # Responsibility
//! - Translate `RowStore` calls into REST requests.
//! - Map error responses to `StoreErrorKind` using status and error type.
//!
//! # Invariants
//! - Conflict detection relies on HTTP status / error type, never on the
//!   human-readable message.
//! - Every request carries the project header; the server key is optional.

use super::{Query, Row, RowList, RowStore, StoreError, StoreErrorKind, StoreResult, TableRef};
use crate::config::StoreConfig;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

/// REST client for one hosted project.
#[derive(Debug, Clone)]
pub struct AppwriteRowStore {
    http: Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    total: Option<u64>,
    #[serde(default)]
    rows: Vec<Value>,
}

impl AppwriteRowStore {
    /// Builds a client from explicit store settings.
    ///
    /// # Errors
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StoreError::new(StoreErrorKind::Transport, err.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn rows_url(&self, table: &TableRef) -> String {
        format!(
            "{}/tablesdb/{}/tables/{}/rows",
            self.endpoint, table.database_id, table.table_id
        )
    }

    fn row_url(&self, table: &TableRef, row_id: &str) -> String {
        format!("{}/{row_id}", self.rows_url(table))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => builder.header(KEY_HEADER, key),
            None => builder,
        }
    }

    async fn execute(
        &self,
        op: &'static str,
        table: &TableRef,
        request: RequestBuilder,
    ) -> StoreResult<Option<Value>> {
        let started_at = Instant::now();
        debug!("event=store_request module=store status=start backend=appwrite op={op} table={table}");

        let response = request.send().await.map_err(|err| {
            warn!(
                "event=store_request module=store status=error backend=appwrite op={op} table={table} duration_ms={} error_code=transport error={err}",
                started_at.elapsed().as_millis()
            );
            StoreError::new(StoreErrorKind::Transport, err.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::new(StoreErrorKind::Transport, err.to_string()))?;

        if !status.is_success() {
            let err = error_from_response(status.as_u16(), &body);
            warn!(
                "event=store_request module=store status=error backend=appwrite op={op} table={table} duration_ms={} http_status={} error_code={}",
                started_at.elapsed().as_millis(),
                status.as_u16(),
                err.kind
            );
            return Err(err);
        }

        debug!(
            "event=store_request module=store status=ok backend=appwrite op={op} table={table} duration_ms={}",
            started_at.elapsed().as_millis()
        );

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl RowStore for AppwriteRowStore {
    async fn create_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        let request = self
            .request(Method::POST, self.rows_url(table))
            .json(&json!({ "rowId": row_id, "data": data }));
        let body = self.execute("create_row", table, request).await?;
        Row::from_json(require_body(body)?)
    }

    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> StoreResult<RowList> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_wire()))
            .collect();
        let request = self
            .request(Method::GET, self.rows_url(table))
            .query(&params);
        let body = self.execute("list_rows", table, request).await?;
        parse_row_list(require_body(body)?)
    }

    async fn update_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        let request = self
            .request(Method::PATCH, self.row_url(table, row_id))
            .json(&json!({ "data": data }));
        let body = self.execute("update_row", table, request).await?;
        Row::from_json(require_body(body)?)
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> StoreResult<()> {
        let request = self.request(Method::DELETE, self.row_url(table, row_id));
        self.execute("delete_row", table, request).await?;
        Ok(())
    }
}

fn require_body(body: Option<Value>) -> StoreResult<Value> {
    body.ok_or_else(|| StoreError::new(StoreErrorKind::Decode, "empty response body"))
}

fn parse_row_list(body: Value) -> StoreResult<RowList> {
    let list: ListBody = serde_json::from_value(body)?;
    let rows = list
        .rows
        .into_iter()
        .map(Row::from_json)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(RowList {
        total: list.total,
        rows,
    })
}

/// Maps a non-success response to a structured error.
fn error_from_response(status: u16, body: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let error_type = parsed.error_type.unwrap_or_default();

    let kind = if status == 409 || error_type.ends_with("_already_exists") {
        StoreErrorKind::Conflict
    } else {
        match status {
            404 => StoreErrorKind::NotFound,
            401 | 403 => StoreErrorKind::Unauthorized,
            400 => StoreErrorKind::InvalidQuery,
            _ => StoreErrorKind::Remote,
        }
    };

    let message = parsed
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));
    StoreError::new(kind, message).with_status(status)
}

#[cfg(test)]
mod tests {
    use super::{error_from_response, parse_row_list, AppwriteRowStore};
    use crate::config::StoreConfig;
    use crate::store::{StoreErrorKind, TableRef};
    use serde_json::json;

    fn config() -> StoreConfig {
        StoreConfig {
            endpoint: "https://cloud.example.io/v1/".to_string(),
            project_id: "proj".to_string(),
            api_key: None,
            database_id: "db".to_string(),
            saved_table_id: "saved".to_string(),
            search_table_id: "metrics".to_string(),
        }
    }

    #[test]
    fn builds_table_scoped_urls() {
        let store = AppwriteRowStore::new(&config()).unwrap();
        let table = TableRef::new("db", "saved");
        assert_eq!(
            store.rows_url(&table),
            "https://cloud.example.io/v1/tablesdb/db/tables/saved/rows"
        );
        assert_eq!(
            store.row_url(&table, "r1"),
            "https://cloud.example.io/v1/tablesdb/db/tables/saved/rows/r1"
        );
    }

    #[test]
    fn conflict_is_detected_from_status_and_type() {
        let err = error_from_response(
            409,
            r#"{"message":"Row with the requested ID already exists.","code":409,"type":"row_already_exists"}"#,
        );
        assert_eq!(err.kind, StoreErrorKind::Conflict);
        assert_eq!(err.status, Some(409));

        // The message wording does not matter.
        let err = error_from_response(409, r#"{"message":"duplicate","type":"other"}"#);
        assert!(err.is_conflict());
    }

    #[test]
    fn other_statuses_map_to_kinds() {
        assert_eq!(error_from_response(404, "{}").kind, StoreErrorKind::NotFound);
        assert_eq!(error_from_response(401, "").kind, StoreErrorKind::Unauthorized);
        assert_eq!(error_from_response(400, "{}").kind, StoreErrorKind::InvalidQuery);
        let err = error_from_response(503, "gateway down");
        assert_eq!(err.kind, StoreErrorKind::Remote);
        assert_eq!(err.message, "request failed with status 503");
    }

    #[test]
    fn parses_list_body_with_metadata_fields() {
        let list = parse_row_list(json!({
            "total": 3,
            "rows": [
                {"$id": "a", "$sequence": 1, "movie_id": 1},
                {"$id": "b", "$sequence": 2, "movie_id": 2}
            ]
        }))
        .unwrap();
        assert_eq!(list.total, Some(3));
        assert_eq!(list.rows.len(), 2);
        assert_eq!(list.rows[1].id, "b");
    }
}
