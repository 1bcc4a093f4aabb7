//! Use-case services and UI-facing state controllers.
//!
//! # Responsibility
//! - Orchestrate gateway and catalog calls into screen-level operations.
//! - Own ephemeral UI state (pagination, loading, busy flags).
//!
//! # Invariants
//! - No lock is held across a remote call.
//! - Local state only trails remote state ("deleted remotely, UI catching
//!   up"), never leads it.

pub mod browse;
pub mod movie_detail;
pub mod save_toggle;
pub mod saved_list;
