//! Error types for query building and execution.
//!
//! Every driver-level failure is wrapped in a [`QueryError`] that carries the
//! attempted SQL text and the rendered arguments, while the original error is
//! kept as the [`std::error::Error::source`] for callers that need to classify
//! it further.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Lookup errors (not found)
//! - 2xxx: Constraint violations (unique, foreign key, check, not null, invalid text)
//! - 3xxx: Connection errors (connection, pool)
//! - 5xxx: Execution errors (timeout, syntax, params, unsupported features)
//! - 6xxx: Data errors (type, serialization)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use strata_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::not_found("user")
//!     .with_sql("SELECT * FROM user WHERE id = ?")
//!     .with_args(vec!["42".to_string()]);
//!
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! assert!(err.is_not_found());
//! assert!(err.to_string().starts_with("[S1001]"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lookup errors (1xxx)
    /// A single-row query returned no rows (S1001).
    RecordNotFound = 1001,

    // Constraint errors (2xxx)
    /// Unique constraint violation (S2001).
    UniqueConstraint = 2001,
    /// Foreign key constraint violation (S2002).
    ForeignKeyConstraint = 2002,
    /// Check constraint violation (S2003).
    CheckConstraint = 2003,
    /// Not null constraint violation (S2004).
    NotNullConstraint = 2004,
    /// Value rejected by the column's text representation (S2005).
    InvalidTextRepresentation = 2005,

    // Connection errors (3xxx)
    /// Database connection failed (S3001).
    ConnectionFailed = 3001,
    /// Connection pool exhausted (S3002).
    PoolExhausted = 3002,

    // Query execution errors (5xxx)
    /// Query timeout (S5001).
    QueryTimeout = 5001,
    /// SQL syntax error (S5002).
    SqlSyntax = 5002,
    /// Invalid parameter (S5003).
    InvalidParameter = 5003,
    /// Feature not supported by the database (S5004).
    FeatureNotSupported = 5004,
    /// General database error (S5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Invalid data type (S6001).
    InvalidDataType = 6001,
    /// Serialization error (S6002).
    SerializationError = 6002,
    /// Deserialization error (S6003).
    DeserializationError = 6003,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ForeignKeyConstraint => "Foreign key constraint violation",
            Self::CheckConstraint => "Check constraint violation",
            Self::NotNullConstraint => "Not null constraint violation",
            Self::InvalidTextRepresentation => "Invalid text representation",
            Self::ConnectionFailed => "Database connection failed",
            Self::PoolExhausted => "Connection pool exhausted",
            Self::QueryTimeout => "Query timeout",
            Self::SqlSyntax => "SQL syntax error",
            Self::InvalidParameter => "Invalid parameter",
            Self::FeatureNotSupported => "Feature not supported",
            Self::DatabaseError => "Database error",
            Self::InvalidDataType => "Invalid data type",
            Self::SerializationError => "Serialization error",
            Self::DeserializationError => "Deserialization error",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The query that was being run.
    pub query: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The column involved.
    pub column: Option<String>,
    /// The SQL text that was sent to the database.
    pub sql: Option<String>,
    /// The positional arguments, rendered for diagnostics.
    pub args: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if let Some(ref sql) = self.context.sql {
            write!(f, "\nquery: {}", sql.trim())?;
        }
        Ok(())
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the name of the query being run.
    pub fn with_query(mut self, name: impl Into<String>) -> Self {
        self.context.query = Some(name.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.context.column = Some(column.into());
        self
    }

    /// Set the SQL text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the rendered arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.context.args = args;
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach SQL and arguments unless a deeper layer already did.
    pub(crate) fn in_query(mut self, sql: &str, args: &[crate::SqlValue]) -> Self {
        if self.context.sql.is_none() {
            self.context.sql = Some(sql.to_string());
            self.context.args = args.iter().map(ToString::to_string).collect();
        }
        self
    }

    // ============== Constructor Functions ==============

    /// A single-row query matched no rows.
    pub fn not_found(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::new(ErrorCode::RecordNotFound, format!("no rows returned by {}", what))
    }

    /// Create a unique constraint violation error.
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UniqueConstraint, message)
    }

    /// Create a foreign key violation error.
    pub fn foreign_key_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ForeignKeyConstraint, message)
    }

    /// Create an invalid input error.
    pub fn invalid_input(column: impl Into<String>, message: impl Into<String>) -> Self {
        let column = column.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid input for {}: {}", column, message),
        )
        .with_column(&column)
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ConnectionFailed, format!("Connection error: {}", message))
    }

    /// Create a pool exhausted error.
    pub fn pool_exhausted(max_connections: usize) -> Self {
        Self::new(
            ErrorCode::PoolExhausted,
            format!("Connection pool exhausted (max {} connections)", max_connections),
        )
        .with_help("Increase max_connections or release connections sooner")
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize result: {}", message),
        )
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    // ============== Error Checks ==============

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check if this is a constraint violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UniqueConstraint
                | ErrorCode::ForeignKeyConstraint
                | ErrorCode::CheckConstraint
                | ErrorCode::NotNullConstraint
        )
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self.code, ErrorCode::ConnectionFailed | ErrorCode::PoolExhausted)
    }

    /// Errors a query can legitimately produce on sample data.
    ///
    /// Used by [`crate::harness::QuerySuite`] to tell a broken query apart from
    /// one that merely ran into missing rows or constraint checks.
    pub fn is_benign(&self) -> bool {
        self.is_not_found()
            || matches!(
                self.code,
                ErrorCode::UniqueConstraint
                    | ErrorCode::ForeignKeyConstraint
                    | ErrorCode::CheckConstraint
                    | ErrorCode::InvalidTextRepresentation
                    | ErrorCode::FeatureNotSupported
            )
    }

    /// Get the error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.code
    }

    /// Display the full error with all context.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref query) = self.context.query {
            output.push_str(&format!("  → Query: {}\n", query));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref column) = self.context.column {
            output.push_str(&format!("  → Column: {}\n", column));
        }
        if let Some(ref sql) = self.context.sql {
            output.push_str(&format!("  → SQL: {}\n", sql.trim()));
        }
        if !self.context.args.is_empty() {
            output.push_str(&format!("  → Args: [{}]\n", self.context.args.join(", ")));
        }
        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::serialization(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlValue;
    use std::error::Error as _;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::RecordNotFound.code(), "S1001");
        assert_eq!(ErrorCode::UniqueConstraint.code(), "S2001");
        assert_eq!(ErrorCode::FeatureNotSupported.code(), "S5004");
    }

    #[test]
    fn test_not_found_error() {
        let err = QueryError::not_found("getUser");
        assert!(err.is_not_found());
        assert!(err.is_benign());
        assert!(err.message.contains("getUser"));
    }

    #[test]
    fn test_in_query_keeps_first_context() {
        let err = QueryError::database("boom")
            .in_query("SELECT ?", &[SqlValue::Int(1)])
            .in_query("SELECT COUNT(*)", &[]);

        assert_eq!(err.context.sql.as_deref(), Some("SELECT ?"));
        assert_eq!(err.context.args, vec!["1".to_string()]);
        assert!(err.to_string().contains("query: SELECT ?"));
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::other("disk gone");
        let err = QueryError::database("write failed").with_source(io);
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk gone".to_string()));
    }

    #[test]
    fn test_benign_classification() {
        assert!(QueryError::unique_violation("dup").is_benign());
        assert!(QueryError::new(ErrorCode::FeatureNotSupported, "x").is_benign());
        assert!(QueryError::new(ErrorCode::InvalidTextRepresentation, "x").is_benign());
        assert!(!QueryError::new(ErrorCode::NotNullConstraint, "x").is_benign());
        assert!(!QueryError::new(ErrorCode::SqlSyntax, "x").is_benign());
        assert!(!QueryError::connection("refused").is_benign());
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::foreign_key_violation("FOREIGN KEY constraint failed")
            .with_query("insertModelInfo")
            .with_sql("INSERT INTO model_info VALUES (?)")
            .with_args(vec!["7".to_string()]);

        let output = err.display_full();
        assert!(output.contains("S2002"));
        assert!(output.contains("insertModelInfo"));
        assert!(output.contains("Args: [7]"));
    }
}
