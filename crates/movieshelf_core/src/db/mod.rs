//! SQLite storage bootstrap and the local row-store backend.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Apply schema migrations in deterministic order.
//! - Provide `SqliteRowStore`, a local backend honoring the row-store contract.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No row is read or written before migrations succeed.

use thiserror::Error;

pub mod migrations;
mod open;
pub mod row_store;

pub use open::{open_db, open_db_in_memory};
pub use row_store::SqliteRowStore;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
