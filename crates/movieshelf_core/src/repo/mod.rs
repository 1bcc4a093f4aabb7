//! Gateways translating domain records to row-store records and back.
//!
//! # Responsibility
//! - Own table addressing and query construction for each row type.
//! - Keep store-specific query syntax out of service/controller code.
//!
//! # Invariants
//! - Gateways return semantic absence (`None`) rather than `NotFound` errors
//!   for lookups.
//! - Uniqueness is delegated to the store; gateways only react to
//!   `StoreErrorKind::Conflict`.

pub mod saved_gateway;
pub mod search_metrics;
