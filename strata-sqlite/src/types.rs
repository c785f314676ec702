//! Conversions between bound values and SQLite storage classes.
//!
//! SQLite has no timestamp, UUID, JSON or boolean storage class. Timestamps
//! are stored as RFC 3339 text, UUIDs and JSON as text, booleans as 0/1.
//! Lists never reach the driver: binding expands them into one placeholder
//! per element.

use rusqlite::types::{Value, ValueRef};
use strata_query::SqlValue;

/// Convert a bound value for rusqlite.
pub fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::String(s) => Value::Text(s.clone()),
        SqlValue::Bytes(b) => Value::Blob(b.clone()),
        SqlValue::Json(j) => Value::Text(j.to_string()),
        SqlValue::Time(t) => Value::Text(t.to_rfc3339()),
        SqlValue::Uuid(u) => Value::Text(u.to_string()),
        SqlValue::List(items) => Value::Text(SqlValue::List(items.clone()).to_string()),
    }
}

/// Convert a column value read from SQLite.
pub fn from_sqlite(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => SqlValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Bytes(bytes.to_vec()),
    }
}

/// Read every column of a row.
pub(crate) fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
    (0..width).map(|i| row.get_ref(i).map(from_sqlite)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_storage_classes() {
        assert_eq!(to_sqlite(&SqlValue::Bool(true)), Value::Integer(1));
        assert_eq!(to_sqlite(&SqlValue::Null), Value::Null);
        assert_eq!(
            to_sqlite(&SqlValue::Json(serde_json::json!({"a": 1}))),
            Value::Text(r#"{"a":1}"#.into())
        );
    }

    #[test]
    fn test_time_and_uuid_as_text() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            to_sqlite(&SqlValue::Time(at)),
            Value::Text("2024-01-02T03:04:05+00:00".into())
        );

        let id = Uuid::nil();
        assert_eq!(to_sqlite(&SqlValue::Uuid(id)), Value::Text(id.to_string()));
    }

    #[test]
    fn test_from_sqlite() {
        assert_eq!(from_sqlite(ValueRef::Integer(4)), SqlValue::Int(4));
        assert_eq!(from_sqlite(ValueRef::Text(b"hi")), SqlValue::String("hi".into()));
        assert_eq!(from_sqlite(ValueRef::Blob(&[1, 2])), SqlValue::Bytes(vec![1, 2]));
    }
}
