//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::context::AttemptContext;
use super::error::ObserverError;

/// Observer trait for retry attempt events
///
/// Implement this trait to receive callbacks during retry execution.
/// This is useful for logging, metrics collection, or debugging.
///
/// Only `on_attempt_failed` is required. It runs after every failed attempt,
/// the final one included, and may fail: an `Err` (or a panic) is recorded as
/// an [`ObserverError`] and the session carries on as if the hook succeeded.
///
/// # Example
///
/// ```rust
/// use dbretry_core::retry::{AttemptContext, ObserverError, RetryObserver};
/// use std::error::Error;
///
/// struct FailureCounter;
///
/// impl RetryObserver for FailureCounter {
///     fn on_attempt_failed(
///         &self,
///         ctx: AttemptContext,
///         error: &dyn Error,
///     ) -> Result<(), ObserverError> {
///         // Record failure metric
///         let _ = (ctx.attempt(), error.to_string());
///         Ok(())
///     }
/// }
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called when an attempt is about to start
    fn on_attempt_start(&self, ctx: AttemptContext) {
        let _ = ctx;
    }

    /// Called after every failed attempt, including the last one
    ///
    /// # Arguments
    ///
    /// * `ctx` - Which attempt failed and the session's attempt budget
    /// * `error` - The error that caused the failure
    fn on_attempt_failed(&self, ctx: AttemptContext, error: &dyn Error)
        -> Result<(), ObserverError>;

    /// Called when the operation succeeds
    ///
    /// # Arguments
    ///
    /// * `ctx` - The attempt that succeeded
    /// * `total_duration` - Total time spent across all attempts
    fn on_success(&self, ctx: AttemptContext, total_duration: Duration) {
        let _ = (ctx, total_duration);
    }

    /// Called when all attempts are exhausted
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        let _ = (attempts, final_error);
    }

    /// Called when a retry predicate rejects the error of `attempt`
    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        let _ = (attempt, error);
    }

    /// Called when the session is cancelled through its token
    ///
    /// # Arguments
    ///
    /// * `attempts` - Attempts started before the session stopped
    /// * `error` - The last attempt error, if any attempt failed
    fn on_cancelled(&self, attempts: u32, error: Option<&dyn Error>) {
        let _ = (attempts, error);
    }
}

/// A no-op observer that does nothing
///
/// The default observer of an executor built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_failed(
        &self,
        _ctx: AttemptContext,
        _error: &dyn Error,
    ) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG (first attempt) or INFO (retries)
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_non_retryable`: WARN
/// - `on_cancelled`: WARN
///
/// # Example
///
/// ```rust
/// use dbretry_core::retry::TracingObserver;
///
/// let observer = TracingObserver::new("orders.insert");
/// assert_eq!(observer.operation(), "orders.insert");
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - A descriptive name for the operation being retried
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("db")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, ctx: AttemptContext) {
        if ctx.is_first() {
            tracing::debug!(
                operation = %self.operation,
                attempt = ctx.attempt(),
                max_attempts = ctx.max_attempts(),
                "starting attempt"
            );
        } else {
            tracing::info!(
                operation = %self.operation,
                attempt = ctx.attempt(),
                max_attempts = ctx.max_attempts(),
                "retrying"
            );
        }
    }

    fn on_attempt_failed(
        &self,
        ctx: AttemptContext,
        error: &dyn Error,
    ) -> Result<(), ObserverError> {
        tracing::warn!(
            operation = %self.operation,
            attempt = ctx.attempt(),
            max_attempts = ctx.max_attempts(),
            error = %error,
            "attempt failed"
        );
        Ok(())
    }

    fn on_success(&self, ctx: AttemptContext, total_duration: Duration) {
        if ctx.is_first() {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        } else {
            tracing::info!(
                operation = %self.operation,
                attempt = ctx.attempt(),
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %final_error,
            "all retry attempts exhausted"
        );
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "error is not retryable"
        );
    }

    fn on_cancelled(&self, attempts: u32, error: Option<&dyn Error>) {
        if let Some(err) = error {
            tracing::warn!(
                operation = %self.operation,
                attempts = attempts,
                error = %err,
                "retry cancelled"
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                attempts = attempts,
                "retry cancelled"
            );
        }
    }
}

/// An observer backed by a closure
///
/// ```rust
/// use dbretry_core::retry::{AttemptContext, ClosureObserver};
/// use std::error::Error;
///
/// let observer = ClosureObserver::new(|ctx: AttemptContext, error: &dyn Error| {
///     eprintln!("attempt {}/{} failed: {}", ctx.attempt(), ctx.max_attempts(), error);
///     Ok(())
/// });
/// # let _ = observer;
/// ```
pub struct ClosureObserver<F> {
    callback: F,
}

impl<F> ClosureObserver<F>
where
    F: Fn(AttemptContext, &dyn Error) -> Result<(), ObserverError> + Send + Sync,
{
    /// Create a new closure-based observer
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> RetryObserver for ClosureObserver<F>
where
    F: Fn(AttemptContext, &dyn Error) -> Result<(), ObserverError> + Send + Sync,
{
    fn on_attempt_failed(
        &self,
        ctx: AttemptContext,
        error: &dyn Error,
    ) -> Result<(), ObserverError> {
        (self.callback)(ctx, error)
    }
}

/// An observer that collects statistics about retry attempts
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    non_retryable: AtomicU32,
    cancellations: AtomicU32,
    failed_attempts: Mutex<Vec<u32>>,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of failures
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of sessions stopped by a retry predicate
    pub fn non_retryable(&self) -> u32 {
        self.non_retryable.load(Ordering::SeqCst)
    }

    /// Get the number of cancellations
    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Attempt numbers reported as failed, in the order they were reported
    pub fn failed_attempts(&self) -> Vec<u32> {
        self.failed_attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _ctx: AttemptContext) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(
        &self,
        ctx: AttemptContext,
        _error: &dyn Error,
    ) -> Result<(), ObserverError> {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.failed_attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ctx.attempt());
        Ok(())
    }

    fn on_success(&self, _ctx: AttemptContext, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Error) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_non_retryable(&self, _attempt: u32, _error: &dyn Error) {
        self.non_retryable.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32, _error: Option<&dyn Error>) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement RetryObserver for Arc<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, ctx: AttemptContext) {
        (**self).on_attempt_start(ctx)
    }

    fn on_attempt_failed(
        &self,
        ctx: AttemptContext,
        error: &dyn Error,
    ) -> Result<(), ObserverError> {
        (**self).on_attempt_failed(ctx, error)
    }

    fn on_success(&self, ctx: AttemptContext, total_duration: Duration) {
        (**self).on_success(ctx, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, error: Option<&dyn Error>) {
        (**self).on_cancelled(attempts, error)
    }
}

/// Implement RetryObserver for Box<T> where T: RetryObserver
impl<T: RetryObserver + ?Sized> RetryObserver for Box<T> {
    fn on_attempt_start(&self, ctx: AttemptContext) {
        (**self).on_attempt_start(ctx)
    }

    fn on_attempt_failed(
        &self,
        ctx: AttemptContext,
        error: &dyn Error,
    ) -> Result<(), ObserverError> {
        (**self).on_attempt_failed(ctx, error)
    }

    fn on_success(&self, ctx: AttemptContext, total_duration: Duration) {
        (**self).on_success(ctx, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Error) {
        (**self).on_exhausted(attempts, final_error)
    }

    fn on_non_retryable(&self, attempt: u32, error: &dyn Error) {
        (**self).on_non_retryable(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, error: Option<&dyn Error>) {
        (**self).on_cancelled(attempts, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        let error = io::Error::other("test");

        // These should all be no-ops
        observer.on_attempt_start(AttemptContext::new(1, 3));
        assert!(observer
            .on_attempt_failed(AttemptContext::new(1, 3), &error)
            .is_ok());
        observer.on_success(AttemptContext::new(2, 3), Duration::from_millis(500));
        observer.on_exhausted(3, &error);
        observer.on_non_retryable(1, &error);
        observer.on_cancelled(2, Some(&error));
    }

    #[test]
    fn test_stats_observer() {
        let observer = StatsObserver::new();
        let error = io::Error::other("test");

        observer.on_attempt_start(AttemptContext::new(1, 3));
        observer.on_attempt_failed(AttemptContext::new(1, 3), &error).unwrap();
        observer.on_attempt_start(AttemptContext::new(2, 3));
        observer.on_success(AttemptContext::new(2, 3), Duration::from_millis(500));

        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.exhaustions(), 0);
        assert_eq!(observer.failed_attempts(), vec![1]);

        observer.on_non_retryable(2, &error);
        assert_eq!(observer.non_retryable(), 1);
        assert_eq!(observer.cancellations(), 0);
    }

    #[test]
    fn test_closure_observer_forwards_result() {
        let observer = ClosureObserver::new(|ctx: AttemptContext, _error: &dyn Error| {
            if ctx.attempt() == 2 {
                Err(ObserverError::failed(ctx.attempt(), "log sink unavailable"))
            } else {
                Ok(())
            }
        });
        let error = io::Error::other("test");

        assert!(observer.on_attempt_failed(AttemptContext::new(1, 3), &error).is_ok());
        let err = observer
            .on_attempt_failed(AttemptContext::new(2, 3), &error)
            .unwrap_err();
        assert_eq!(err.attempt(), 2);
    }

    #[test]
    fn test_tracing_observer_creation() {
        let observer = TracingObserver::new("test_operation");
        assert_eq!(observer.operation(), "test_operation");

        let default_observer = TracingObserver::default();
        assert_eq!(default_observer.operation(), "db");
    }

    #[test]
    fn test_arc_observer() {
        let observer = Arc::new(StatsObserver::new());
        let error = io::Error::other("test");

        observer.on_attempt_start(AttemptContext::new(1, 3));
        observer.on_attempt_failed(AttemptContext::new(1, 3), &error).unwrap();

        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.failures(), 1);
    }

    #[test]
    fn test_boxed_dyn_observer() {
        let observer: Box<dyn RetryObserver> = Box::new(StatsObserver::new());
        let error = io::Error::other("test");

        assert!(observer
            .on_attempt_failed(AttemptContext::new(1, 1), &error)
            .is_ok());
    }
}
