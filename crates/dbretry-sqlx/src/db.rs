//! Retrying query helpers
//!
//! Every helper re-issues the full statement on each attempt. Statements
//! passed here must be idempotent: an `INSERT` that committed before the
//! connection dropped will be applied twice.

use dbretry_core::retry::{
    AlwaysRetry, RetryExecutor, RetryObserver, RetryPredicate, TracingObserver,
};
use dbretry_core::{DbRetryConfig, RetryPolicy};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::FromRow;

use crate::error::{DbRetryError, Result};
use crate::params::{encode_params, SqlParam};
use crate::transient::TransientErrorPredicate;

const OBSERVER_NAME: &str = "db";

/// Database helper running each call under a retry session
///
/// `retry_limit` on every method overrides the policy's attempt budget for
/// that call only.
///
/// # Example
///
/// ```rust,no_run
/// use dbretry_core::RetryPolicy;
/// use dbretry_sqlx::{sql_params, DbRetry};
///
/// # async fn example() -> dbretry_sqlx::Result<()> {
/// let db = DbRetry::new(RetryPolicy::default());
/// let rows = db
///     .execute_url(
///         "sqlite://orders.db",
///         "UPDATE orders SET shipped = 1 WHERE id = ?",
///         &sql_params![17_i64],
///         Some(3),
///     )
///     .await?;
/// println!("{} rows updated", rows);
/// # Ok(())
/// # }
/// ```
pub struct DbRetry<P = AlwaysRetry, O = TracingObserver> {
    executor: RetryExecutor<P, O>,
}

impl DbRetry {
    /// Create a helper that retries every failure and logs through `tracing`
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_executor(
            RetryExecutor::builder()
                .with_policy(policy)
                .with_observer(TracingObserver::new(OBSERVER_NAME))
                .build(),
        )
    }

    /// Create a helper from a loaded configuration
    pub fn from_config(config: &DbRetryConfig) -> Self {
        Self::new(config.retry)
    }
}

impl Default for DbRetry {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl DbRetry<TransientErrorPredicate, TracingObserver> {
    /// Create a helper that stops on errors that are not transient
    pub fn transient_only(policy: RetryPolicy) -> Self {
        Self::with_executor(
            RetryExecutor::builder()
                .with_policy(policy)
                .with_predicate(TransientErrorPredicate)
                .with_observer(TracingObserver::new(OBSERVER_NAME))
                .build(),
        )
    }
}

impl<P, O> DbRetry<P, O> {
    /// Wrap a preconfigured executor
    pub fn with_executor(executor: RetryExecutor<P, O>) -> Self {
        Self { executor }
    }

    /// The executor backing this helper
    pub fn executor(&self) -> &RetryExecutor<P, O> {
        &self.executor
    }
}

impl<P, O> DbRetry<P, O>
where
    P: RetryPredicate<sqlx::Error>,
    O: RetryObserver,
{
    /// Run a query and collect every row
    pub async fn query<T>(
        &self,
        pool: &SqlitePool,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let arguments = encode_params(params)?;
        tracing::debug!(sql, params = params.len(), "running query");

        let rows = self
            .executor
            .execute_with_limit(retry_limit, || {
                sqlx::query_as_with::<_, T, _>(sql, arguments.clone()).fetch_all(pool)
            })
            .await?;

        Ok(rows)
    }

    /// Run a query and return the first row, if any
    pub async fn query_single<T>(
        &self,
        pool: &SqlitePool,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let arguments = encode_params(params)?;
        tracing::debug!(sql, params = params.len(), "running single-row query");

        let row = self
            .executor
            .execute_with_limit(retry_limit, || {
                sqlx::query_as_with::<_, T, _>(sql, arguments.clone()).fetch_optional(pool)
            })
            .await?;

        Ok(row)
    }

    /// Run a statement and return the number of rows affected
    pub async fn execute(
        &self,
        pool: &SqlitePool,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<u64> {
        let arguments = encode_params(params)?;
        tracing::debug!(sql, params = params.len(), "running statement");

        let result = self
            .executor
            .execute_with_limit(retry_limit, || {
                sqlx::query_with(sql, arguments.clone()).execute(pool)
            })
            .await?;

        Ok(result.rows_affected())
    }

    /// [`query`](Self::query) against a connection string
    pub async fn query_url<T>(
        &self,
        url: &str,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let pool = open_pool(url)?;
        let result = self.query(&pool, sql, params, retry_limit).await;
        pool.close().await;
        result
    }

    /// [`query_single`](Self::query_single) against a connection string
    pub async fn query_single_url<T>(
        &self,
        url: &str,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let pool = open_pool(url)?;
        let result = self.query_single(&pool, sql, params, retry_limit).await;
        pool.close().await;
        result
    }

    /// [`execute`](Self::execute) against a connection string
    pub async fn execute_url(
        &self,
        url: &str,
        sql: &str,
        params: &[SqlParam],
        retry_limit: Option<u32>,
    ) -> Result<u64> {
        let pool = open_pool(url)?;
        let result = self.execute(&pool, sql, params, retry_limit).await;
        pool.close().await;
        result
    }
}

/// Open a single-connection pool without connecting
///
/// The connection is established by the first attempt, so connect failures
/// go through the retry loop.
fn open_pool(url: &str) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_lazy(url)
        .map_err(|source| DbRetryError::InvalidConnectionString { source })
}
