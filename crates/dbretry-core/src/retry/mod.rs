//! Retry execution engine for database operations
//!
//! Wraps a caller-supplied operation and re-invokes it until it succeeds or
//! the attempt budget of a [`RetryPolicy`](crate::types::RetryPolicy) runs out,
//! waiting a fixed delay between attempts.
//!
//! # Features
//!
//! - Fixed delay, bounded attempts, per-call attempt limit override
//! - Observable attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//! - Optional retry predicates to stop early on permanent errors
//! - Cooperative cancellation through `CancellationToken`
//!
//! # Idempotence
//!
//! The operation may run more than once. It must be safe to repeat (idempotent
//! or tolerant of its own side effects); the executor cannot tell a transient
//! failure from a permanent one unless a predicate says so. Pass a closure that
//! starts a fresh attempt on every call, never an already-started future.
//!
//! # Example
//!
//! ```rust,no_run
//! use dbretry_core::retry::{run_with_retry, RetryError, TracingObserver};
//! use dbretry_core::RetryPolicy;
//!
//! async fn example() -> Result<u64, RetryError<std::io::Error>> {
//!     let policy = RetryPolicy::default();
//!     let observer = TracingObserver::new("orders.count");
//!
//!     run_with_retry(&policy, &observer, || async {
//!         // One attempt against the database
//!         Ok(42)
//!     })
//!     .await
//! }
//! ```

mod context;
mod error;
mod executor;
mod observer;
mod predicate;

pub use context::AttemptContext;
pub use error::{ObserverError, RetryError};
pub use executor::{run_with_retry, RetryExecutor, RetryExecutorBuilder};
pub use observer::{ClosureObserver, NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use predicate::{AlwaysRetry, ClosurePredicate, RetryPredicate};
