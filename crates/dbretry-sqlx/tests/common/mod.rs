//! Shared test utilities for dbretry-sqlx integration tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use dbretry_core::RetryPolicy;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Schema used by every test database
pub const ORDERS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    customer TEXT NOT NULL,
    total REAL NOT NULL,
    shipped BOOLEAN NOT NULL DEFAULT 0,
    note TEXT,
    receipt BLOB
)";

/// Row type for the `orders` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub customer: String,
    pub total: f64,
    pub shipped: bool,
}

/// A policy with no delay, so failing tests finish immediately
pub fn instant_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(Duration::ZERO, max_attempts)
}

/// Open an in-memory database with the orders schema and three orders
///
/// An in-memory database lives only as long as its connection, so the pool
/// holds exactly one connection that never expires.
pub async fn seeded_memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::query(ORDERS_SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create orders table");

    let seed = [("alice", 12.5, true), ("bob", 40.0, false), ("alice", 7.25, false)];
    for (customer, total, shipped) in seed {
        sqlx::query("INSERT INTO orders (customer, total, shipped) VALUES (?, ?, ?)")
            .bind(customer)
            .bind(total)
            .bind(shipped)
            .execute(&pool)
            .await
            .expect("Failed to seed orders");
    }

    pool
}

/// Connection string for a database file, created on first connect
pub fn file_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Connection string for a database in a directory that does not exist
pub fn unreachable_url() -> String {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("orders.db");
    drop(dir);
    format!("sqlite://{}", path.display())
}
