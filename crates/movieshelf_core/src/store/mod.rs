//! Row-store contract shared by the hosted and local backends.
//!
//! # Responsibility
//! - Define the create/list/update/delete surface gateways depend on.
//! - Carry store failures as a structured `StoreErrorKind`.
//!
//! # Invariants
//! - Uniqueness violations surface as `StoreErrorKind::Conflict` regardless
//!   of backend; callers never inspect error message text.
//! - A `Row` keeps store metadata (`$id`, timestamps) apart from data fields.
//!
//! # See also
//! - `crate::db::row_store` for the SQLite backend.

pub mod appwrite;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

pub use appwrite::AppwriteRowStore;

/// Default page size applied by stores when no limit query is given.
pub const DEFAULT_LIST_LIMIT: u32 = 25;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure category reported by every row-store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Unique index or row id collision.
    Conflict,
    NotFound,
    /// Malformed query, identifier or cursor.
    InvalidQuery,
    Unauthorized,
    /// Request never produced a response.
    Transport,
    /// Response or stored data does not match the expected shape.
    Decode,
    /// Local storage engine failure.
    Storage,
    /// Any other remote failure.
    Remote,
}

impl Display for StoreErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::InvalidQuery => "invalid_query",
            Self::Unauthorized => "unauthorized",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Storage => "storage",
            Self::Remote => "remote",
        };
        f.write_str(label)
    }
}

/// Structured row-store failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row store {kind} error: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    /// HTTP status when the failure came from a remote response.
    pub status: Option<u16>,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(StoreErrorKind::Decode, value.to_string())
    }
}

/// Address of one table inside one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub database_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(database_id: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.database_id, self.table_id)
    }
}

/// List query modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Attribute equals any of the values.
    Equal { attribute: String, values: Vec<Value> },
    Limit(u32),
    OrderAsc(String),
    OrderDesc(String),
    /// Rows strictly after the row with this id, in the requested order.
    CursorAfter(String),
}

#[derive(Serialize)]
struct WireQuery<'a> {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribute: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Self::OrderAsc(attribute.into())
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Self::OrderDesc(attribute.into())
    }

    pub fn cursor_after(row_id: impl Into<String>) -> Self {
        Self::CursorAfter(row_id.into())
    }

    /// Serializes the query in the hosted store's JSON query syntax.
    pub fn to_wire(&self) -> String {
        let wire = match self {
            Self::Equal { attribute, values } => WireQuery {
                method: "equal",
                attribute: Some(attribute),
                values: Some(values.clone()),
            },
            Self::Limit(limit) => WireQuery {
                method: "limit",
                attribute: None,
                values: Some(vec![Value::from(*limit)]),
            },
            Self::OrderAsc(attribute) => WireQuery {
                method: "orderAsc",
                attribute: Some(attribute),
                values: None,
            },
            Self::OrderDesc(attribute) => WireQuery {
                method: "orderDesc",
                attribute: Some(attribute),
                values: None,
            },
            Self::CursorAfter(row_id) => WireQuery {
                method: "cursorAfter",
                attribute: None,
                values: Some(vec![Value::from(row_id.as_str())]),
            },
        };
        // A struct of strings and JSON values always serializes.
        serde_json::to_string(&wire).unwrap_or_default()
    }
}

/// One stored row: store metadata plus data fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub data: Map<String, Value>,
}

impl Row {
    /// Splits a store JSON object into metadata and data fields.
    ///
    /// Keys starting with `$` are metadata; only `$id`, `$createdAt` and
    /// `$updatedAt` are retained.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        let Value::Object(object) = value else {
            return Err(StoreError::new(
                StoreErrorKind::Decode,
                "row payload is not a JSON object",
            ));
        };

        let mut row = Row::default();
        for (key, value) in object {
            match key.as_str() {
                "$id" => {
                    row.id = value
                        .as_str()
                        .ok_or_else(|| {
                            StoreError::new(StoreErrorKind::Decode, "row `$id` is not a string")
                        })?
                        .to_string();
                }
                "$createdAt" => row.created_at = value.as_str().map(str::to_string),
                "$updatedAt" => row.updated_at = value.as_str().map(str::to_string),
                other if other.starts_with('$') => {}
                _ => {
                    row.data.insert(key, value);
                }
            }
        }

        if row.id.is_empty() {
            return Err(StoreError::new(
                StoreErrorKind::Decode,
                "row payload has no `$id`",
            ));
        }
        Ok(row)
    }

    /// Reassembles the row as a JSON object with `$id` and data fields.
    pub fn to_json(&self) -> Value {
        let mut object = self.data.clone();
        object.insert("$id".to_string(), Value::from(self.id.as_str()));
        if let Some(created_at) = &self.created_at {
            object.insert("$createdAt".to_string(), Value::from(created_at.as_str()));
        }
        if let Some(updated_at) = &self.updated_at {
            object.insert("$updatedAt".to_string(), Value::from(updated_at.as_str()));
        }
        Value::Object(object)
    }

    /// Decodes the row into a typed record that names `$id` explicitly.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.to_json()).map_err(|err| {
            StoreError::new(
                StoreErrorKind::Decode,
                format!("row `{}` does not match expected shape: {err}", self.id),
            )
        })
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }
}

/// List response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowList {
    /// Matching row count ignoring limit and cursor, when the store reports it.
    pub total: Option<u64>,
    pub rows: Vec<Row>,
}

/// Serializes a typed record into row data fields.
pub fn to_row_data<T: Serialize>(value: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::new(
            StoreErrorKind::Decode,
            "row data must serialize to a JSON object",
        )),
    }
}

/// Current UTC time in the store's timestamp format.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Managed table storage consumed as an opaque persistence backend.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Creates a row with a caller-chosen unique id.
    async fn create_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row>;

    /// Lists rows matching all `queries`.
    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> StoreResult<RowList>;

    /// Merges `data` into an existing row.
    async fn update_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row>;

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: RowStore + ?Sized> RowStore for Arc<S> {
    async fn create_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        (**self).create_row(table, row_id, data).await
    }

    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> StoreResult<RowList> {
        (**self).list_rows(table, queries).await
    }

    async fn update_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        (**self).update_row(table, row_id, data).await
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> StoreResult<()> {
        (**self).delete_row(table, row_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::{Query, Row, StoreErrorKind};
    use serde_json::json;

    #[test]
    fn queries_serialize_to_wire_syntax() {
        assert_eq!(
            Query::equal("movie_id", 42).to_wire(),
            r#"{"method":"equal","attribute":"movie_id","values":[42]}"#
        );
        assert_eq!(Query::Limit(24).to_wire(), r#"{"method":"limit","values":[24]}"#);
        assert_eq!(
            Query::order_desc("saved_at").to_wire(),
            r#"{"method":"orderDesc","attribute":"saved_at"}"#
        );
        assert_eq!(
            Query::cursor_after("abc").to_wire(),
            r#"{"method":"cursorAfter","values":["abc"]}"#
        );
    }

    #[test]
    fn row_from_json_separates_metadata() {
        let row = Row::from_json(json!({
            "$id": "r1",
            "$createdAt": "2025-01-01T00:00:00.000+00:00",
            "$permissions": [],
            "$tableId": "saved",
            "movie_id": 42
        }))
        .unwrap();
        assert_eq!(row.id, "r1");
        assert_eq!(row.created_at.as_deref(), Some("2025-01-01T00:00:00.000+00:00"));
        assert_eq!(row.data.len(), 1);
        assert_eq!(row.get("movie_id"), Some(&json!(42)));
    }

    #[test]
    fn row_without_id_is_a_decode_error() {
        let err = Row::from_json(json!({"movie_id": 1})).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Decode);
        let err = Row::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Decode);
    }
}
