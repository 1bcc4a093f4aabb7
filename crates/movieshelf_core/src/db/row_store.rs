//! SQLite-backed implementation of the row-store contract.
//!
//! # Responsibility
//! - Store rows of any table as JSON documents in `store_rows`.
//! - Enforce per-table unique indexes declared with `ensure_unique_index`.
//! - Evaluate equality, ordering, limit and cursor-after queries.
//!
//! # Invariants
//! - Unique violations are detected from the SQLite constraint error code
//!   and reported as `StoreErrorKind::Conflict`.
//! - Identifiers interpolated into SQL are validated by regex first.
//! - Index names hex-encode the table ids, so distinct tables never share
//!   an index; the registry rejects a name bound to another table.
//! - The connection lock is never held across an `.await`.

use super::{open_db, open_db_in_memory, DbResult};
use crate::store::{
    timestamp_now, Query, Row, RowList, RowStore, StoreError, StoreErrorKind, StoreResult,
    TableRef, DEFAULT_LIST_LIMIT,
};
use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,35}$").expect("valid id regex"));
static ATTRIBUTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid attribute regex"));

const MAX_LIST_LIMIT: u32 = 5000;

/// Local row store over one SQLite connection.
pub struct SqliteRowStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteRowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRowStore").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ListPlan {
    filters: Vec<(String, Vec<SqlValue>)>,
    orders: Vec<(String, bool)>,
    limit: Option<u32>,
    cursor_after: Option<String>,
}

impl SqliteRowStore {
    /// Opens (or creates) a database file with migrations applied.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Declares `attribute` unique within `table`.
    ///
    /// Idempotent. Fails with `Conflict` when existing rows already violate
    /// the index.
    pub fn ensure_unique_index(&self, table: &TableRef, attribute: &str) -> StoreResult<()> {
        validate_table(table)?;
        validate_attribute(attribute)?;
        let index_name = format!(
            "uidx_{}_{}_{}",
            hex_id(&table.database_id),
            hex_id(&table.table_id),
            attribute
        );

        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(storage_error)?;
            let registered: Option<(String, String, String)> = tx
                .query_row(
                    "SELECT database_id, table_id, attribute
                     FROM store_unique_indexes
                     WHERE index_name = ?1;",
                    params![index_name],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(storage_error)?;
            if let Some((database_id, table_id, owner_attribute)) = registered {
                if database_id != table.database_id
                    || table_id != table.table_id
                    || owner_attribute != attribute
                {
                    return Err(StoreError::new(
                        StoreErrorKind::Storage,
                        format!(
                            "unique index `{index_name}` already belongs to {database_id}/{table_id}.{owner_attribute}"
                        ),
                    ));
                }
            }
            tx.execute_batch(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{index_name}\"
                 ON store_rows (json_extract(data, '$.{attribute}'))
                 WHERE database_id = '{}' AND table_id = '{}';",
                table.database_id, table.table_id
            ))
            .map_err(storage_error)?;
            tx.execute(
                "INSERT OR IGNORE INTO store_unique_indexes
                    (database_id, table_id, attribute, index_name)
                 VALUES (?1, ?2, ?3, ?4);",
                params![table.database_id, table.table_id, attribute, index_name],
            )
            .map_err(storage_error)?;
            tx.commit().map_err(storage_error)
        })?;

        debug!(
            "event=unique_index module=store status=ok backend=sqlite table={table} attribute={attribute}"
        );
        Ok(())
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn create_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        validate_table(table)?;
        validate_id(row_id)?;
        let now = timestamp_now();
        let encoded = serde_json::to_string(&data)?;

        let result = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO store_rows
                    (database_id, table_id, row_id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
                params![table.database_id, table.table_id, row_id, encoded, now],
            )
            .map_err(storage_error)
        });

        if let Err(err) = &result {
            warn!(
                "event=store_request module=store status=error backend=sqlite op=create_row table={table} error_code={}",
                err.kind
            );
        }
        result?;

        Ok(Row {
            id: row_id.to_string(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            data,
        })
    }

    async fn list_rows(&self, table: &TableRef, queries: &[Query]) -> StoreResult<RowList> {
        validate_table(table)?;
        let plan = plan_queries(queries)?;
        self.with_conn(|conn| select_rows(conn, table, &plan))
    }

    async fn update_row(
        &self,
        table: &TableRef,
        row_id: &str,
        data: Map<String, Value>,
    ) -> StoreResult<Row> {
        validate_table(table)?;
        self.with_conn(|conn| {
            let tx = conn.transaction().map_err(storage_error)?;
            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT data, created_at FROM store_rows
                     WHERE database_id = ?1 AND table_id = ?2 AND row_id = ?3;",
                    params![table.database_id, table.table_id, row_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(storage_error)?;
            let (stored, created_at) = existing.ok_or_else(|| row_not_found(table, row_id))?;

            let mut merged = decode_data(row_id, &stored)?;
            merged.extend(data);
            let now = timestamp_now();
            tx.execute(
                "UPDATE store_rows SET data = ?1, updated_at = ?2
                 WHERE database_id = ?3 AND table_id = ?4 AND row_id = ?5;",
                params![
                    serde_json::to_string(&merged)?,
                    now,
                    table.database_id,
                    table.table_id,
                    row_id
                ],
            )
            .map_err(storage_error)?;
            tx.commit().map_err(storage_error)?;

            Ok(Row {
                id: row_id.to_string(),
                created_at: Some(created_at),
                updated_at: Some(now),
                data: merged,
            })
        })
    }

    async fn delete_row(&self, table: &TableRef, row_id: &str) -> StoreResult<()> {
        validate_table(table)?;
        let changed = self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM store_rows
                 WHERE database_id = ?1 AND table_id = ?2 AND row_id = ?3;",
                params![table.database_id, table.table_id, row_id],
            )
            .map_err(storage_error)
        })?;

        if changed == 0 {
            return Err(row_not_found(table, row_id));
        }
        Ok(())
    }
}

fn plan_queries(queries: &[Query]) -> StoreResult<ListPlan> {
    let mut plan = ListPlan::default();
    for query in queries {
        match query {
            Query::Equal { attribute, values } => {
                validate_attribute(attribute)?;
                if values.is_empty() {
                    return Err(invalid_query(format!(
                        "equal query on `{attribute}` has no values"
                    )));
                }
                let values = values
                    .iter()
                    .map(json_to_sql)
                    .collect::<StoreResult<Vec<_>>>()?;
                plan.filters.push((attribute.clone(), values));
            }
            Query::Limit(limit) => {
                if *limit > MAX_LIST_LIMIT {
                    return Err(invalid_query(format!(
                        "limit {limit} exceeds maximum {MAX_LIST_LIMIT}"
                    )));
                }
                plan.limit = Some(*limit);
            }
            Query::OrderAsc(attribute) => {
                validate_attribute(attribute)?;
                plan.orders.push((attribute.clone(), false));
            }
            Query::OrderDesc(attribute) => {
                validate_attribute(attribute)?;
                plan.orders.push((attribute.clone(), true));
            }
            Query::CursorAfter(row_id) => plan.cursor_after = Some(row_id.clone()),
        }
    }
    Ok(plan)
}

fn select_rows(conn: &Connection, table: &TableRef, plan: &ListPlan) -> StoreResult<RowList> {
    let mut sql = String::from(
        "SELECT row_id, data, created_at, updated_at FROM store_rows
         WHERE database_id = ? AND table_id = ?",
    );
    let mut binds = vec![
        SqlValue::Text(table.database_id.clone()),
        SqlValue::Text(table.table_id.clone()),
    ];

    for (attribute, values) in &plan.filters {
        let placeholders = vec!["?"; values.len()].join(", ");
        sql.push_str(&format!(
            " AND json_extract(data, '$.{attribute}') IN ({placeholders})"
        ));
        binds.extend(values.iter().cloned());
    }

    sql.push_str(" ORDER BY ");
    for (attribute, descending) in &plan.orders {
        let direction = if *descending { "DESC" } else { "ASC" };
        sql.push_str(&format!("json_extract(data, '$.{attribute}') {direction}, "));
    }
    sql.push_str("seq ASC");

    let mut stmt = conn.prepare(&sql).map_err(storage_error)?;
    let mut rows = stmt
        .query(params_from_iter(binds))
        .map_err(storage_error)?;

    let limit = plan.limit.unwrap_or(DEFAULT_LIST_LIMIT) as usize;
    let mut total = 0u64;
    let mut page = Vec::new();
    let mut past_cursor = plan.cursor_after.is_none();

    while let Some(row) = rows.next().map_err(storage_error)? {
        total += 1;
        let row_id: String = row.get(0).map_err(storage_error)?;
        if !past_cursor {
            past_cursor = plan.cursor_after.as_deref() == Some(row_id.as_str());
            continue;
        }
        if page.len() < limit {
            let stored: String = row.get(1).map_err(storage_error)?;
            page.push(Row {
                data: decode_data(&row_id, &stored)?,
                id: row_id,
                created_at: row.get(2).map_err(storage_error)?,
                updated_at: row.get(3).map_err(storage_error)?,
            });
        }
    }

    if !past_cursor {
        let cursor = plan.cursor_after.as_deref().unwrap_or_default();
        return Err(invalid_query(format!(
            "cursor row `{cursor}` not found in {table}"
        )));
    }

    Ok(RowList {
        total: Some(total),
        rows: page,
    })
}

fn json_to_sql(value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => number
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| number.as_f64().map(SqlValue::Real))
            .ok_or_else(|| invalid_query(format!("unsupported number `{number}`"))),
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        other => Err(invalid_query(format!(
            "equal query values must be scalars, got `{other}`"
        ))),
    }
}

fn decode_data(row_id: &str, stored: &str) -> StoreResult<Map<String, Value>> {
    match serde_json::from_str(stored)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::new(
            StoreErrorKind::Decode,
            format!("stored data for row `{row_id}` is not an object"),
        )),
    }
}

fn storage_error(err: rusqlite::Error) -> StoreError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreErrorKind::Conflict,
        _ => StoreErrorKind::Storage,
    };
    StoreError::new(kind, err.to_string())
}

fn row_not_found(table: &TableRef, row_id: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::NotFound,
        format!("row `{row_id}` not found in {table}"),
    )
}

fn invalid_query(message: String) -> StoreError {
    StoreError::new(StoreErrorKind::InvalidQuery, message)
}

fn validate_table(table: &TableRef) -> StoreResult<()> {
    validate_id(&table.database_id)?;
    validate_id(&table.table_id)
}

fn validate_id(value: &str) -> StoreResult<()> {
    if ID_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid_query(format!("invalid identifier `{value}`")))
    }
}

fn validate_attribute(value: &str) -> StoreResult<()> {
    if ATTRIBUTE_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid_query(format!("invalid attribute `{value}`")))
    }
}

/// Lowercase hex of `value`; never contains `_`.
fn hex_id(value: &str) -> String {
    value.bytes().map(|byte| format!("{byte:02x}")).collect()
}
