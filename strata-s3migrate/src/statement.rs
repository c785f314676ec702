//! Migration statements.
//!
//! A migration body is a JSON array of flat string objects:
//!
//! ```json
//! [
//!     { "action": "UPLOAD", "path": "/videos/intro.mp4", "filename": "intro.mp4" },
//!     { "action": "DELETE", "filename": "old.mp4" }
//! ]
//! ```
//!
//! `UPLOAD` copies the asset at `path` to the object `filename`; `DELETE`
//! removes the object `filename`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use crate::error::{MigrateResult, MigrationError};

/// Statement action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Copy an asset into the bucket.
    Upload,
    /// Remove an object from the bucket.
    Delete,
}

impl Action {
    /// The action as written in a migration body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "UPLOAD",
            Self::Delete => "DELETE",
        }
    }

    fn field_count(&self) -> usize {
        match self {
            Self::Upload => 3,
            Self::Delete => 2,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Upload the asset at `path` as `filename`.
    Upload {
        /// Asset path.
        path: String,
        /// Target object key.
        filename: String,
    },
    /// Delete the object `filename`.
    Delete {
        /// Object key.
        filename: String,
    },
}

impl Statement {
    /// The statement's action.
    pub fn action(&self) -> Action {
        match self {
            Self::Upload { .. } => Action::Upload,
            Self::Delete { .. } => Action::Delete,
        }
    }

    /// The object key the statement touches.
    pub fn filename(&self) -> &str {
        match self {
            Self::Upload { filename, .. } | Self::Delete { filename } => filename,
        }
    }
}

/// Parse a migration body into statements, in order.
///
/// Extra keys are tolerated with a warning. A missing `action`, an unknown
/// action or a missing required field fails the whole body.
pub fn parse_statements(body: &[u8]) -> MigrateResult<Vec<Statement>> {
    let raw: Vec<BTreeMap<String, String>> =
        serde_json::from_slice(body).map_err(MigrationError::Parse)?;

    raw.into_iter().map(parse_statement).collect()
}

fn parse_statement(mut raw: BTreeMap<String, String>) -> MigrateResult<Statement> {
    let Some(name) = raw.get("action") else {
        return Err(MigrationError::MissingField {
            action: "unknown".into(),
            field: "action",
        });
    };

    let action = match name.as_str() {
        "UPLOAD" => Action::Upload,
        "DELETE" => Action::Delete,
        other => return Err(MigrationError::UnknownAction(other.to_string())),
    };

    if raw.len() != action.field_count() {
        warn!(
            action = %action,
            keys = ?raw.keys().collect::<Vec<_>>(),
            "migration statement has an unexpected schema"
        );
    }

    let mut take = |field: &'static str| {
        raw.remove(field).ok_or_else(|| MigrationError::MissingField {
            action: action.to_string(),
            field,
        })
    };

    Ok(match action {
        Action::Upload => Statement::Upload {
            path: take("path")?,
            filename: take("filename")?,
        },
        Action::Delete => Statement::Delete {
            filename: take("filename")?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upload_then_delete() {
        let body = br#"[
            {"action": "UPLOAD", "path": "/a", "filename": "b.mp4"},
            {"action": "DELETE", "filename": "b.mp4"}
        ]"#;

        let stmts = parse_statements(body).unwrap();
        assert_eq!(
            stmts,
            vec![
                Statement::Upload {
                    path: "/a".into(),
                    filename: "b.mp4".into()
                },
                Statement::Delete {
                    filename: "b.mp4".into()
                },
            ]
        );
        assert_eq!(stmts[0].action().as_str(), "UPLOAD");
        assert_eq!(stmts[1].action().as_str(), "DELETE");
    }

    #[test]
    fn test_extra_keys_are_tolerated() {
        let stmts =
            parse_statements(br#"[{"action": "DELETE", "filename": "x", "note": "old"}]"#).unwrap();
        assert_eq!(stmts[0].filename(), "x");
    }

    #[test]
    fn test_missing_action() {
        let err = parse_statements(br#"[{"filename": "x"}]"#).unwrap_err();
        assert!(matches!(err, MigrationError::MissingField { field: "action", .. }));
    }

    #[test]
    fn test_unknown_action() {
        let err = parse_statements(br#"[{"action": "COPY", "filename": "x"}]"#).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownAction(a) if a == "COPY"));
    }

    #[test]
    fn test_missing_upload_path() {
        let err = parse_statements(br#"[{"action": "UPLOAD", "filename": "x"}]"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing path field in UPLOAD migration statement");
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            parse_statements(br#"{"action": "DELETE"}"#),
            Err(MigrationError::Parse(_))
        ));
        assert!(matches!(
            parse_statements(br#"[{"action": "DELETE", "filename": 3}]"#),
            Err(MigrationError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_statements(b"[]").unwrap(), vec![]);
    }
}
