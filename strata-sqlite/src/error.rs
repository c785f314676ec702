//! Error types for SQLite operations.

use std::fmt;

use rusqlite::ffi;
use strata_query::error::{ErrorCode, QueryError};

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug)]
pub enum SqliteError {
    /// No connection became available in time.
    PoolTimeout(usize),
    /// The pool was shut down.
    PoolClosed,
    /// SQLite driver error.
    Sqlite(tokio_rusqlite::Error),
    /// Invalid configuration.
    Config(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The underlying rusqlite error, if any.
    pub fn rusqlite(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Sqlite(tokio_rusqlite::Error::Rusqlite(e)) => Some(e),
            _ => None,
        }
    }

    /// The query error code this error maps to.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PoolTimeout(_) => ErrorCode::PoolExhausted,
            Self::PoolClosed => ErrorCode::ConnectionFailed,
            Self::Config(_) => ErrorCode::Internal,
            Self::Sqlite(tokio_rusqlite::Error::ConnectionClosed) => ErrorCode::ConnectionFailed,
            Self::Sqlite(tokio_rusqlite::Error::Rusqlite(e)) => classify(e),
            Self::Sqlite(_) => ErrorCode::DatabaseError,
        }
    }
}

/// Map a rusqlite error onto the query error taxonomy.
pub fn classify(err: &rusqlite::Error) -> ErrorCode {
    match err {
        rusqlite::Error::QueryReturnedNoRows => ErrorCode::RecordNotFound,
        rusqlite::Error::SqliteFailure(e, _) => match e.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                ErrorCode::UniqueConstraint
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ErrorCode::ForeignKeyConstraint,
            ffi::SQLITE_CONSTRAINT_CHECK => ErrorCode::CheckConstraint,
            ffi::SQLITE_CONSTRAINT_NOTNULL => ErrorCode::NotNullConstraint,
            ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => ErrorCode::QueryTimeout,
            ffi::SQLITE_CANTOPEN => ErrorCode::ConnectionFailed,
            _ => ErrorCode::DatabaseError,
        },
        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            ErrorCode::DeserializationError
        }
        rusqlite::Error::ToSqlConversionFailure(_) => ErrorCode::SerializationError,
        rusqlite::Error::InvalidParameterCount(..) | rusqlite::Error::InvalidParameterName(_) => {
            ErrorCode::InvalidParameter
        }
        _ => ErrorCode::DatabaseError,
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolTimeout(max) => {
                write!(f, "timed out waiting for one of {} connections", max)
            }
            Self::PoolClosed => write!(f, "connection pool is closed"),
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tokio_rusqlite::Error> for SqliteError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(tokio_rusqlite::Error::Rusqlite(err))
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        if let SqliteError::PoolTimeout(max) = err {
            return QueryError::pool_exhausted(max).with_source(err);
        }
        let code = err.code();
        let message = match &err {
            SqliteError::Sqlite(tokio_rusqlite::Error::Rusqlite(e)) => e.to_string(),
            other => other.to_string(),
        };
        QueryError::new(code, message).with_source(err)
    }
}
