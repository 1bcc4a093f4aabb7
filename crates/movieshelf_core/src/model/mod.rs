//! Typed records exchanged with the metadata provider and the row store.
//!
//! # Responsibility
//! - Give every remote response shape an explicit Rust record.
//! - Keep "may be absent" fields as `Option` or defaulted collections.
//!
//! # Invariants
//! - Missing or `null` collection fields decode to empty collections.
//! - Saved rows are snapshots; nothing here refreshes them from the provider.

pub mod movie;
pub mod release;
pub mod saved;
pub mod search_metric;

use serde::{Deserialize, Deserializer};

/// Decodes `null` as the type's default value.
///
/// Used for collection fields that remote services may send as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
