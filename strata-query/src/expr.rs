//! Boolean combinators over SQL fragments.
//!
//! Empty fragments mean "no constraint" and are dropped, so an expression
//! built only from empty parts is itself empty.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean operator joining sibling fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Op {
    /// All parts must hold.
    #[default]
    #[serde(rename = "AND")]
    And,
    /// Any part may hold.
    #[serde(rename = "OR")]
    Or,
}

impl Op {
    /// Get the SQL keyword for this operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Join the non-empty `parts` with `op`.
///
/// Two or more parts are wrapped in parentheses; a single part is returned
/// as-is.
pub fn cond<I, S>(op: Op, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let parts: Vec<String> = parts
        .into_iter()
        .map(Into::into)
        .filter(|p| !p.is_empty())
        .collect();

    match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => format!("({})", parts.join(&format!(" {} ", op.as_sql()))),
    }
}

/// Join the non-empty `parts` with `AND`.
pub fn and<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    cond(Op::And, parts)
}

/// Join the non-empty `parts` with `OR`.
pub fn or<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    cond(Op::Or, parts)
}

/// Negate a fragment. Negating nothing is still nothing.
pub fn not(part: impl Into<String>) -> String {
    let part = part.into();
    if part.is_empty() {
        part
    } else {
        format!("NOT({})", part)
    }
}

/// Prefix a non-empty expression with `WHERE`.
pub fn where_clause(expr: impl Into<String>) -> String {
    let expr = expr.into();
    if expr.is_empty() {
        expr
    } else {
        format!("WHERE {}", expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_skips_empty_parts() {
        assert_eq!(and(["", "a = 1", ""]), "a = 1");
        assert_eq!(and(["a = 1", "b = 2"]), "(a = 1 AND b = 2)");
        assert_eq!(and(Vec::<String>::new()), "");
    }

    #[test]
    fn test_or_nests() {
        let inner = and(["a = 1", "b = 2"]);
        assert_eq!(or([inner, "c = 3".to_string()]), "((a = 1 AND b = 2) OR c = 3)");
    }

    #[test]
    fn test_not() {
        assert_eq!(not(""), "");
        assert_eq!(not("a = 1"), "NOT(a = 1)");
    }

    #[test]
    fn test_where_clause() {
        assert_eq!(where_clause(""), "");
        assert_eq!(where_clause("a = 1"), "WHERE a = 1");
    }

    #[test]
    fn test_op_serde() {
        assert_eq!(serde_json::to_string(&Op::Or).unwrap(), "\"OR\"");
        assert_eq!(serde_json::from_str::<Op>("\"AND\"").unwrap(), Op::And);
        assert!(serde_json::from_str::<Op>("\"and\"").is_err());
    }
}
