//! Flutter bridge entry points for MovieShelf.

pub mod api;
