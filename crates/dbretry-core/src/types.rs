//! Configuration types shared by the retry engine and the database helpers

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attempt budget used when neither the call nor the configuration sets one
pub const DEFAULT_RETRY_LIMIT: u32 = 5;

/// Wait between failed attempts when the configuration does not set one
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Retry policy for a database operation
///
/// A policy is immutable once built. Per-call adjustments go through
/// [`RetryPolicy::with_max_attempts`] and [`RetryPolicy::resolve`], which
/// return a new value and leave the original untouched.
///
/// # Example
///
/// ```rust
/// use dbretry_core::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(Duration::from_millis(250), 3);
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.resolve(Some(7)).max_attempts(), 7);
/// assert_eq!(policy.resolve(None).max_attempts(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Wait between failed attempts, written as `delay-ms` in config files
    #[serde(rename = "delay-ms", default = "default_delay", with = "delay_ms")]
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_RETRY_LIMIT
}

fn default_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

/// Whole-millisecond representation of the delay in config files
///
/// Delays with a sub-millisecond part are written rounded up, so a non-zero
/// delay never serializes as zero.
mod delay_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = delay.as_nanos().div_ceil(1_000_000);
        serializer.serialize_u64(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl RetryPolicy {
    /// Create a policy with the given delay and attempt budget
    ///
    /// A `max_attempts` of zero is accepted here and rejected when the policy
    /// is executed or validated.
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait between failed attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Copy of this policy with a different attempt budget
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Copy of this policy with a different delay
    pub fn with_delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    /// Apply an optional per-call attempt limit
    pub fn resolve(&self, retry_limit: Option<u32>) -> Self {
        match retry_limit {
            Some(limit) => self.with_max_attempts(limit),
            None => *self,
        }
    }

    /// Check that the policy allows at least one attempt
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max-attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Database connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// Connection string handed to the database driver
    #[serde(default)]
    pub url: Option<String>,
}

/// Top-level dbretry configuration (dbretry.yaml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbRetryConfig {
    /// Default retry policy for database operations
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl DbRetryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()
    }
}
