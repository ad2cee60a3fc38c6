//! Estante: a read-only book recommendation dashboard.
//!
//! Two CSV tables (a book catalog and a table of per-user predicted
//! ratings) are loaded once into an immutable [`store::Store`]. A
//! [`query::QueryEngine`] answers Top-N and best/worst queries over the
//! positional join of the two tables, and the results are served through a
//! CLI and the [`dashboard`] HTTP server.

#![warn(missing_docs)]

pub mod dashboard;
pub mod error;
pub mod query;
pub mod store;
