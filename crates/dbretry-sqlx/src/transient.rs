//! Transient error classification
//!
//! The default helper retries every failure. [`TransientErrorPredicate`] narrows
//! that to errors that can succeed on a later attempt: lost connections, an
//! exhausted pool and a busy or locked database file.

use dbretry_core::retry::RetryPredicate;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Check whether a database error is worth retrying
pub fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            // Extended result codes keep the primary code in the low byte
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
        _ => false,
    }
}

/// Retry predicate backed by [`is_transient`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientErrorPredicate;

impl RetryPredicate<sqlx::Error> for TransientErrorPredicate {
    fn should_retry(&self, error: &sqlx::Error) -> bool {
        let transient = is_transient(error);
        if !transient {
            tracing::debug!(error = %error, "database error is not transient");
        }
        transient
    }
}
