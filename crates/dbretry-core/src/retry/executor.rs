//! Retry execution engine
//!
//! This module provides the retry loop shared by every entry point, with
//! configurable policy, predicate, observer and cancellation.

use std::any::Any;
use std::error::Error;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::RetryPolicy;

use super::context::AttemptContext;
use super::error::{ObserverError, RetryError};
use super::observer::{NoOpObserver, RetryObserver};
use super::predicate::{AlwaysRetry, RetryPredicate};

/// Execute an async operation with retry logic based on a policy
///
/// This is a convenience function for one-off retry sessions. For a reusable
/// executor with a default policy, use `RetryExecutorBuilder`.
///
/// # Arguments
///
/// * `policy` - The retry policy to use
/// * `observer` - Receives attempt events; pass `&NoOpObserver` to ignore them
/// * `op` - A closure that starts one attempt and returns its future
///
/// # Returns
///
/// The result of the first successful attempt, or a `RetryError` if the
/// policy is invalid or every attempt fails.
///
/// # Example
///
/// ```rust,no_run
/// use dbretry_core::retry::{run_with_retry, NoOpObserver};
/// use dbretry_core::RetryPolicy;
///
/// async fn example() {
///     let policy = RetryPolicy::default();
///
///     let result = run_with_retry(&policy, &NoOpObserver, || async {
///         // Simulated operation that might fail
///         Ok::<_, std::io::Error>("success")
///     })
///     .await;
/// }
/// ```
pub async fn run_with_retry<O, F, Fut, T, E>(
    policy: &RetryPolicy,
    observer: &O,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    O: RetryObserver + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error,
{
    run_session(policy, &AlwaysRetry, observer, None, |_| op()).await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use dbretry_core::retry::{RetryExecutorBuilder, TracingObserver};
/// use dbretry_core::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("orders.insert"))
///     .build();
/// assert_eq!(executor.policy().max_attempts(), 5);
/// ```
pub struct RetryExecutorBuilder<P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
}

impl Default for RetryExecutorBuilder<AlwaysRetry, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<AlwaysRetry, NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: AlwaysRetry,
            observer: NoOpObserver,
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    /// Set the default retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry predicate
    ///
    /// The predicate determines whether an error should be retried.
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
        }
    }

    /// Set the observer
    ///
    /// The observer receives callbacks during retry execution.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
        }
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
        }
    }
}

/// A retry executor with a default policy, a predicate and an observer
///
/// The executor holds no per-session state, so one instance can drive any
/// number of concurrent sessions through `&self`.
pub struct RetryExecutor<P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
}

impl RetryExecutor {
    /// Create an executor with the given policy, retrying every error silently
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: AlwaysRetry,
            observer: NoOpObserver,
        }
    }

    /// Start building an executor
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<P, O> RetryExecutor<P, O> {
    /// The default policy used when a call does not override it
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<P, O> RetryExecutor<P, O>
where
    O: RetryObserver,
{
    /// Execute an operation with the executor's default policy
    ///
    /// # Arguments
    ///
    /// * `op` - A closure that starts one attempt and returns its future
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
    {
        self.execute_with_limit(None, op).await
    }

    /// Execute an operation, optionally overriding the attempt budget
    ///
    /// `Some(limit)` replaces the policy's `max_attempts` for this call only;
    /// `None` uses the executor's policy.
    pub async fn execute_with_limit<F, Fut, T, E>(
        &self,
        retry_limit: Option<u32>,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
    {
        self.execute_with_context(retry_limit, move |_| op()).await
    }

    /// Execute an attempt-aware operation
    ///
    /// The closure receives the `AttemptContext` of the attempt it starts.
    pub async fn execute_with_context<F, Fut, T, E>(
        &self,
        retry_limit: Option<u32>,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
    {
        let policy = self.policy.resolve(retry_limit);
        run_session(&policy, &self.predicate, &self.observer, None, op).await
    }

    /// Execute an attempt-aware operation that stops when `cancel` fires
    ///
    /// The token is checked before each attempt and raced against both the
    /// in-flight attempt and the delay. A cancelled session returns
    /// `RetryError::Cancelled`; completed attempts are not undone.
    pub async fn execute_cancellable<F, Fut, T, E>(
        &self,
        retry_limit: Option<u32>,
        cancel: &CancellationToken,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error,
        P: RetryPredicate<E>,
    {
        let policy = self.policy.resolve(retry_limit);
        run_session(&policy, &self.predicate, &self.observer, Some(cancel), op).await
    }
}

/// One retry session: attempts run strictly one after another
async fn run_session<P, O, F, Fut, T, E>(
    policy: &RetryPolicy,
    predicate: &P,
    observer: &O,
    cancel: Option<&CancellationToken>,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    P: RetryPredicate<E> + ?Sized,
    O: RetryObserver + ?Sized,
    F: FnMut(AttemptContext) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error,
{
    let max_attempts = policy.max_attempts();
    if max_attempts == 0 {
        return Err(RetryError::invalid_configuration(max_attempts));
    }

    let start = Instant::now();
    let mut observer_errors = Vec::new();
    let mut last_error: Option<E> = None;
    let mut attempt = 1;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            let started = attempt - 1;
            observer.on_cancelled(started, last_error.as_ref().map(|e| e as &dyn Error));
            return Err(RetryError::cancelled(started, last_error, observer_errors));
        }

        let ctx = AttemptContext::new(attempt, max_attempts);
        observer.on_attempt_start(ctx);

        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => None,
                outcome = op(ctx) => Some(outcome),
            },
            None => Some(op(ctx).await),
        };

        let Some(outcome) = outcome else {
            observer.on_cancelled(attempt, last_error.as_ref().map(|e| e as &dyn Error));
            return Err(RetryError::cancelled(attempt, last_error, observer_errors));
        };

        let err = match outcome {
            Ok(value) => {
                observer.on_success(ctx, start.elapsed());
                return Ok(value);
            }
            Err(err) => err,
        };

        if let Err(observer_error) = notify_failure(observer, ctx, &err) {
            tracing::error!(attempt, error = %observer_error, "retry observer failed");
            observer_errors.push(observer_error);
        }

        if !predicate.should_retry(&err) {
            observer.on_non_retryable(attempt, &err);
            return Err(RetryError::non_retryable(attempt, err, observer_errors));
        }

        if ctx.is_last() {
            observer.on_exhausted(attempt, &err);
            return Err(RetryError::exhausted(
                attempt,
                err,
                start.elapsed(),
                observer_errors,
            ));
        }

        last_error = Some(err);

        let delay = policy.delay();
        if !delay.is_zero() {
            match cancel {
                Some(token) => tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        observer.on_cancelled(attempt, last_error.as_ref().map(|e| e as &dyn Error));
                        return Err(RetryError::cancelled(attempt, last_error, observer_errors));
                    }
                    () = tokio::time::sleep(delay) => {}
                },
                None => tokio::time::sleep(delay).await,
            }
        }

        attempt += 1;
    }
}

/// Run the failure hook, turning an error or a panic into an `ObserverError`
fn notify_failure<O>(observer: &O, ctx: AttemptContext, error: &dyn Error) -> Result<(), ObserverError>
where
    O: RetryObserver + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| observer.on_attempt_failed(ctx, error))) {
        Ok(result) => result,
        Err(payload) => Err(ObserverError::panicked(
            ctx.attempt(),
            panic_message(payload.as_ref()),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
