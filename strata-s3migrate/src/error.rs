//! Error types for the S3 migration driver.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while migrating a bucket.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration body is not a JSON array of string maps.
    #[error("Invalid migration body: {0}")]
    Parse(#[source] serde_json::Error),

    /// A statement lacks a field its action requires.
    #[error("Missing {field} field in {action} migration statement")]
    MissingField {
        /// Statement action, or `unknown` when the action itself is missing.
        action: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A statement names an action the driver does not know.
    #[error("Unknown action {0} in migration statement")]
    UnknownAction(String),

    /// An upload source could not be read.
    #[error("Error opening asset {path}: {message}")]
    Asset {
        /// Asset path as written in the statement.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The object store rejected a call.
    #[error("Object store error during {op} of '{key}': {message}")]
    Store {
        /// Operation name.
        op: &'static str,
        /// Object key, or the bucket name for bucket operations.
        key: String,
        /// Error reported by the store.
        message: String,
    },

    /// An object that must exist does not.
    #[error("Object '{0}' not found")]
    NotFound(String),

    /// The state object does not decode.
    #[error("Error decoding migration state: {0}")]
    State(#[source] serde_json::Error),

    /// A previous run stopped mid-way.
    #[error("Dirty database version {0}. Fix and force version.")]
    Dirty(i64),

    /// A migration source is malformed or lacks a version.
    #[error("Migration source error: {0}")]
    Source(String),

    /// The DSN could not be parsed.
    #[error("Invalid DSN '{dsn}': {message}")]
    InvalidDsn {
        /// The DSN as given.
        dsn: String,
        /// What is wrong with it.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrationError {
    /// Create a store error.
    pub fn store(op: &'static str, key: impl Into<String>, message: impl ToString) -> Self {
        Self::Store {
            op,
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create an asset error.
    pub fn asset(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Asset {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a migration source error.
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a DSN error.
    pub fn invalid_dsn(dsn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDsn {
            dsn: dsn.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error means a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if the migration body itself is at fault.
    pub fn is_statement_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::MissingField { .. } | Self::UnknownAction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrationError::MissingField {
            action: "UPLOAD".into(),
            field: "path",
        };
        assert_eq!(err.to_string(), "Missing path field in UPLOAD migration statement");

        let err = MigrationError::store("put", "a/b.mp4", "access denied");
        assert!(err.to_string().contains("a/b.mp4"));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_dirty_display() {
        assert_eq!(
            MigrationError::Dirty(4).to_string(),
            "Dirty database version 4. Fix and force version."
        );
    }

    #[test]
    fn test_classification() {
        assert!(MigrationError::NotFound("k".into()).is_not_found());
        assert!(MigrationError::UnknownAction("COPY".into()).is_statement_error());
        assert!(!MigrationError::Dirty(1).is_statement_error());
    }
}
