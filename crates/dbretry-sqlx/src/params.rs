//! Positional query parameters

use sqlx::sqlite::SqliteArguments;
use sqlx::Arguments;

use crate::error::DbRetryError;

/// A positional parameter bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Integer(i64::from(value))
    }
}

impl From<u32> for SqlParam {
    fn from(value: u32) -> Self {
        SqlParam::Integer(i64::from(value))
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Real(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(value: Vec<u8>) -> Self {
        SqlParam::Blob(value)
    }
}

impl From<&[u8]> for SqlParam {
    fn from(value: &[u8]) -> Self {
        SqlParam::Blob(value.to_vec())
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlParam::Null, Into::into)
    }
}

/// Build a `Vec<SqlParam>` from heterogeneous values
///
/// # Example
///
/// ```rust
/// use dbretry_sqlx::{sql_params, SqlParam};
///
/// let params = sql_params!["alice", 42_i64, None::<f64>];
/// assert_eq!(params[0], SqlParam::Text("alice".to_string()));
/// assert_eq!(params[2], SqlParam::Null);
/// ```
#[macro_export]
macro_rules! sql_params {
    () => {
        ::std::vec::Vec::<$crate::SqlParam>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::SqlParam::from($value)),+]
    };
}

/// Bind all parameters into one argument buffer
///
/// The buffer is encoded once and cloned for every attempt.
pub(crate) fn encode_params<'q>(
    params: &[SqlParam],
) -> Result<SqliteArguments<'q>, DbRetryError> {
    let mut arguments = SqliteArguments::default();

    for (index, param) in params.iter().enumerate() {
        let bound = match param {
            SqlParam::Null => arguments.add(Option::<i64>::None),
            SqlParam::Integer(v) => arguments.add(*v),
            SqlParam::Real(v) => arguments.add(*v),
            SqlParam::Bool(v) => arguments.add(*v),
            SqlParam::Text(v) => arguments.add(v.clone()),
            SqlParam::Blob(v) => arguments.add(v.clone()),
        };
        bound.map_err(|source| DbRetryError::Encode { index, source })?;
    }

    Ok(arguments)
}
