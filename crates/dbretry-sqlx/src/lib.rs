//! # dbretry-sqlx
//!
//! Retrying database helpers for SQLite built on `sqlx`:
//! - `query`, `query_single` and `execute` over an existing pool
//! - connection-string variants that open and close a scoped pool
//! - positional parameters via [`SqlParam`] and [`sql_params!`]
//! - an opt-in predicate that only retries transient errors

mod db;
mod error;
mod params;
mod transient;

pub use db::DbRetry;
pub use error::{DbRetryError, Result};
pub use params::SqlParam;
pub use transient::{is_transient, TransientErrorPredicate};
