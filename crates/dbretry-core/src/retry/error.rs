//! Error types for the retry execution engine
//!
//! This module defines the terminal outcomes of a failed retry session:
//! invalid configuration, exhausted attempts, cancellation and non-retryable
//! errors, plus the error raised by a misbehaving observer.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Failure raised by a [`RetryObserver`](super::RetryObserver) hook
///
/// Observer failures never stop the retry loop and never replace the
/// operation's error. They are logged and collected on the terminal
/// [`RetryError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserverError {
    /// The observer returned an error
    #[error("observer failed on attempt {attempt}: {message}")]
    Failed { attempt: u32, message: String },

    /// The observer panicked
    #[error("observer panicked on attempt {attempt}: {message}")]
    Panicked { attempt: u32, message: String },
}

impl ObserverError {
    /// Create an observer failure for the given attempt
    pub fn failed(attempt: u32, message: impl Into<String>) -> Self {
        ObserverError::Failed {
            attempt,
            message: message.into(),
        }
    }

    pub(crate) fn panicked(attempt: u32, message: impl Into<String>) -> Self {
        ObserverError::Panicked {
            attempt,
            message: message.into(),
        }
    }

    /// The attempt during which the observer failed
    pub fn attempt(&self) -> u32 {
        match self {
            ObserverError::Failed { attempt, .. } | ObserverError::Panicked { attempt, .. } => {
                *attempt
            }
        }
    }
}

/// Errors that can end a retry session
///
/// The error type is generic over `E`, the underlying error type from the
/// operation being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The policy allows no attempts; nothing was executed
    InvalidConfiguration {
        /// The rejected attempt budget
        max_attempts: u32,
    },

    /// All attempts have been exhausted
    ///
    /// Returned when the attempt budget has been used up and the operation
    /// still failed.
    Exhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The error from the final attempt
        source: E,
        /// Total duration spent across all attempts
        total_duration: Duration,
        /// Failures raised by the observer along the way
        observer_errors: Vec<ObserverError>,
    },

    /// The session was cancelled externally
    Cancelled {
        /// Number of attempts started before cancellation
        attempts: u32,
        /// The last error that occurred, if any
        last_error: Option<E>,
        /// Failures raised by the observer along the way
        observer_errors: Vec<ObserverError>,
    },

    /// A retry predicate rejected the error
    NonRetryable {
        /// The attempt that produced the error
        attempt: u32,
        /// The rejected error
        source: E,
        /// Failures raised by the observer along the way
        observer_errors: Vec<ObserverError>,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::InvalidConfiguration { max_attempts } => {
                write!(
                    f,
                    "invalid retry configuration: max attempts must be at least 1, got {}",
                    max_attempts
                )
            }
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
                ..
            } => {
                write!(
                    f,
                    "retry exhausted after {} attempts over {:.2}s: {}",
                    attempts,
                    total_duration.as_secs_f64(),
                    source
                )
            }
            RetryError::Cancelled {
                attempts,
                last_error,
                ..
            } => {
                if let Some(err) = last_error {
                    write!(f, "retry cancelled after {} attempts: {}", attempts, err)
                } else {
                    write!(f, "retry cancelled after {} attempts", attempts)
                }
            }
            RetryError::NonRetryable {
                attempt, source, ..
            } => {
                write!(f, "non-retryable error on attempt {}: {}", attempt, source)
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Cancelled {
                last_error: Some(err),
                ..
            } => Some(err),
            RetryError::NonRetryable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Create a new invalid configuration error
    pub fn invalid_configuration(max_attempts: u32) -> Self {
        RetryError::InvalidConfiguration { max_attempts }
    }

    /// Create a new exhausted error
    pub fn exhausted(
        attempts: u32,
        source: E,
        total_duration: Duration,
        observer_errors: Vec<ObserverError>,
    ) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_duration,
            observer_errors,
        }
    }

    /// Create a new cancelled error
    pub fn cancelled(
        attempts: u32,
        last_error: Option<E>,
        observer_errors: Vec<ObserverError>,
    ) -> Self {
        RetryError::Cancelled {
            attempts,
            last_error,
            observer_errors,
        }
    }

    /// Create a new non-retryable error
    pub fn non_retryable(attempt: u32, source: E, observer_errors: Vec<ObserverError>) -> Self {
        RetryError::NonRetryable {
            attempt,
            source,
            observer_errors,
        }
    }

    /// Get the number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::InvalidConfiguration { .. } => 0,
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Cancelled { attempts, .. } => *attempts,
            RetryError::NonRetryable { attempt, .. } => *attempt,
        }
    }

    /// Check if the policy was rejected before any attempt
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, RetryError::InvalidConfiguration { .. })
    }

    /// Check if this error indicates all attempts were exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if this error indicates cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// Check if this error is non-retryable
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// Observer failures collected during the session
    pub fn observer_errors(&self) -> &[ObserverError] {
        match self {
            RetryError::InvalidConfiguration { .. } => &[],
            RetryError::Exhausted {
                observer_errors, ..
            }
            | RetryError::Cancelled {
                observer_errors, ..
            }
            | RetryError::NonRetryable {
                observer_errors, ..
            } => observer_errors,
        }
    }

    /// Get the underlying error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error,
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::InvalidConfiguration { .. } => None,
        }
    }

    /// Get a reference to the underlying error
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::InvalidConfiguration { .. } => None,
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::InvalidConfiguration { max_attempts } => {
                RetryError::InvalidConfiguration { max_attempts }
            }
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
                observer_errors,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_duration,
                observer_errors,
            },
            RetryError::Cancelled {
                attempts,
                last_error,
                observer_errors,
            } => RetryError::Cancelled {
                attempts,
                last_error: last_error.map(f),
                observer_errors,
            },
            RetryError::NonRetryable {
                attempt,
                source,
                observer_errors,
            } => RetryError::NonRetryable {
                attempt,
                source: f(source),
                observer_errors,
            },
        }
    }
}
