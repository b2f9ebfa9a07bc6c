//! # dbretry-core
//!
//! Core library for dbretry providing:
//! - Retry execution engine with a fixed-delay, bounded-attempt policy
//! - Observer hooks for attempt-level logging and metrics
//! - Configuration file parsing (dbretry.yaml) with environment overrides

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use types::{DatabaseConfig, DbRetryConfig, RetryPolicy};
