//! Retry predicates
//!
//! A predicate decides whether a failed attempt may be retried. The default,
//! [`AlwaysRetry`], retries every failure until the attempt budget is used up.

/// A predicate that determines whether an error should be retried
///
/// Implement this trait to short-circuit retries for errors known to be
/// permanent (constraint violations, syntax errors, ...).
///
/// # Example
///
/// ```rust
/// use dbretry_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error) -> bool {
///         // Don't retry permanent errors
///         !matches!(
///             error.kind(),
///             ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput
///         )
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E) -> bool;
}

/// A predicate that always returns true (all errors are retryable)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}
