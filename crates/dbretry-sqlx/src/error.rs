//! Error types for the database helpers

use dbretry_core::retry::RetryError;
use thiserror::Error;

/// Errors returned by [`DbRetry`](crate::DbRetry)
#[derive(Debug, Error)]
pub enum DbRetryError {
    /// The connection string could not be parsed; no attempt was made
    #[error("invalid connection string: {source}")]
    InvalidConnectionString {
        #[source]
        source: sqlx::Error,
    },

    /// A parameter could not be bound; no attempt was made
    #[error("failed to encode parameter {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: sqlx::error::BoxDynError,
    },

    /// The retried call failed
    #[error(transparent)]
    Retry(#[from] RetryError<sqlx::Error>),
}

impl DbRetryError {
    /// Number of attempts made before the error was returned
    pub fn attempts(&self) -> u32 {
        match self {
            DbRetryError::Retry(err) => err.attempts(),
            _ => 0,
        }
    }

    /// The database error from the last attempt, if any
    pub fn database_error(&self) -> Option<&sqlx::Error> {
        match self {
            DbRetryError::Retry(err) => err.source_ref(),
            _ => None,
        }
    }

    /// Get the retry outcome, if the call got as far as running attempts
    pub fn as_retry(&self) -> Option<&RetryError<sqlx::Error>> {
        match self {
            DbRetryError::Retry(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for database helper operations
pub type Result<T> = std::result::Result<T, DbRetryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_attempts_from_retry_error() {
        let err = DbRetryError::from(RetryError::exhausted(
            3,
            sqlx::Error::PoolTimedOut,
            Duration::from_secs(10),
            Vec::new(),
        ));

        assert_eq!(err.attempts(), 3);
        assert!(matches!(
            err.database_error(),
            Some(sqlx::Error::PoolTimedOut)
        ));
        assert!(err.to_string().contains("retry exhausted after 3 attempts"));
    }

    #[test]
    fn test_configuration_errors_make_no_attempts() {
        let err = DbRetryError::InvalidConnectionString {
            source: sqlx::Error::Configuration("unknown value".into()),
        };

        assert_eq!(err.attempts(), 0);
        assert!(err.database_error().is_none());
        assert!(err.as_retry().is_none());
        assert!(err.to_string().starts_with("invalid connection string"));
    }
}
