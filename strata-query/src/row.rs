//! Result rows and conversion into Rust values.
//!
//! Drivers hand back [`Row`]s of [`SqlValue`]s. [`FromValue`] converts a single
//! column, [`FromRow`] a whole row. Aliased columns like `"model.id"` can be
//! read into nested structs with [`Row::scoped`].
//!
//! ```rust
//! use strata_query::{Row, SqlValue};
//!
//! let row = Row::new(
//!     vec!["model.id".into(), "model.name".into(), "info.text".into()],
//!     vec![SqlValue::Int(1), SqlValue::String("a".into()), SqlValue::Null],
//! );
//!
//! let model = row.scoped("model");
//! assert_eq!(model.get::<i64>("id").unwrap(), 1);
//! assert!(row.scoped("info").is_all_null());
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::param::SqlValue;
use crate::value::Value;

/// One result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a row from parallel column names and values.
    ///
    /// # Panics
    ///
    /// If the two vectors differ in length; a driver produced a malformed row.
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "row has {} columns but {} values",
            columns.len(),
            values.len()
        );
        Self { columns, values }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column.
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Convert a column by name.
    pub fn get<T: FromValue>(&self, column: &str) -> QueryResult<T> {
        let value = self.value(column).ok_or_else(|| {
            QueryError::deserialization(format!("column `{}` not in result", column))
                .with_column(column)
        })?;
        T::from_value(value).map_err(|e| e.with_column(column))
    }

    /// Convert a column by position.
    pub fn get_index<T: FromValue>(&self, index: usize) -> QueryResult<T> {
        let value = self.values.get(index).ok_or_else(|| {
            QueryError::deserialization(format!("column index {} out of range", index))
        })?;
        T::from_value(value)
    }

    /// The columns under `prefix.`, with the prefix stripped.
    pub fn scoped(&self, prefix: &str) -> Row {
        let lead = format!("{}.", prefix);
        let (columns, values) = self
            .columns
            .iter()
            .zip(&self.values)
            .filter_map(|(c, v)| c.strip_prefix(&lead).map(|rest| (rest.to_string(), v.clone())))
            .unzip();
        Row { columns, values }
    }

    /// Whether every value is NULL, as for the missing side of an outer join.
    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(SqlValue::is_null)
    }

    /// Read a nested struct from the `prefix.` columns; `None` if they are all NULL.
    pub fn scoped_opt<T: FromRow>(&self, prefix: &str) -> QueryResult<Option<T>> {
        let scoped = self.scoped(prefix);
        if scoped.is_empty() || scoped.is_all_null() {
            return Ok(None);
        }
        T::from_row(&scoped).map(Some)
    }
}

/// Conversion from a single column value.
pub trait FromValue: Sized {
    /// Convert the value.
    fn from_value(value: &SqlValue) -> QueryResult<Self>;
}

fn mismatch<T>(value: &SqlValue, expected: &str) -> QueryResult<T> {
    Err(QueryError::deserialization(format!(
        "cannot read {} as {}",
        value, expected
    )))
}

impl FromValue for SqlValue {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::Int(v) => Ok(*v != 0),
            other => mismatch(other, "bool"),
        }
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &SqlValue) -> QueryResult<Self> {
                    match value {
                        SqlValue::Int(v) => <$t>::try_from(*v).map_err(|e| {
                            QueryError::deserialization(format!("{} out of range: {}", v, e))
                        }),
                        SqlValue::Bool(v) => Ok(*v as $t),
                        other => mismatch(other, stringify!($t)),
                    }
                }
            }
        )*
    };
}

from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            SqlValue::Int(v) => Ok(*v as f64),
            other => mismatch(other, "f64"),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::String(v) => Ok(v.clone()),
            SqlValue::Uuid(v) => Ok(v.to_string()),
            SqlValue::Time(v) => Ok(v.to_rfc3339()),
            SqlValue::Json(v) => Ok(v.to_string()),
            SqlValue::Bytes(v) => String::from_utf8(v.clone())
                .map_err(|e| QueryError::deserialization(e.to_string())),
            other => mismatch(other, "text"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Bytes(v) => Ok(v.clone()),
            SqlValue::String(v) => Ok(v.clone().into_bytes()),
            other => mismatch(other, "bytes"),
        }
    }
}

/// Parse RFC 3339, or the `YYYY-MM-DD HH:MM:SS[.f]` text SQLite stores, as UTC.
pub fn parse_timestamp(text: &str) -> QueryResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| QueryError::deserialization(format!("invalid timestamp {:?}: {}", text, e)))
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Time(v) => Ok(*v),
            SqlValue::String(v) => parse_timestamp(v),
            SqlValue::Int(v) => DateTime::from_timestamp(*v, 0)
                .ok_or_else(|| QueryError::deserialization(format!("invalid unix time {}", v))),
            other => mismatch(other, "timestamp"),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Uuid(v) => Ok(*v),
            SqlValue::String(v) => {
                Uuid::parse_str(v).map_err(|e| QueryError::deserialization(e.to_string()))
            }
            SqlValue::Bytes(v) => {
                Uuid::from_slice(v).map_err(|e| QueryError::deserialization(e.to_string()))
            }
            other => mismatch(other, "uuid"),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Json(v) => Ok(v.clone()),
            SqlValue::String(v) => serde_json::from_str(v)
                .map_err(|e| QueryError::deserialization(e.to_string())),
            SqlValue::Bytes(v) => serde_json::from_slice(v)
                .map_err(|e| QueryError::deserialization(e.to_string())),
            SqlValue::Null => Ok(serde_json::Value::Null),
            other => mismatch(other, "json"),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Value<T> {
    fn from_value(value: &SqlValue) -> QueryResult<Self> {
        match value {
            SqlValue::Null => Ok(Value::empty()),
            SqlValue::String(s) if s.is_empty() => Ok(Value::empty()),
            other => T::from_value(other).map(Value::new),
        }
    }
}

/// Conversion from a whole row.
pub trait FromRow: Sized {
    /// Convert the row.
    fn from_row(row: &Row) -> QueryResult<Self>;
}

macro_rules! from_row_first_column {
    ($($t:ty),*) => {
        $(
            impl FromRow for $t {
                fn from_row(row: &Row) -> QueryResult<Self> {
                    row.get_index(0)
                }
            }
        )*
    };
}

from_row_first_column!(bool, i32, i64, u32, u64, f64, String, DateTime<Utc>, Uuid, serde_json::Value);

/// Implement [`FromRow`] by reading each field from the column of the same
/// name, and make the type usable as a single-row query output.
///
/// ```rust
/// use strata_query::{impl_from_row, FromRow, Row, SqlValue};
///
/// struct User {
///     id: i64,
///     email: String,
///     name: Option<String>,
/// }
///
/// impl_from_row!(User {
///     id: i64,
///     email: String,
///     name: Option<String>,
/// });
///
/// let row = Row::new(
///     vec!["id".into(), "email".into(), "name".into()],
///     vec![SqlValue::Int(1), SqlValue::String("a@b.c".into()), SqlValue::Null],
/// );
/// let user = User::from_row(&row).unwrap();
/// assert_eq!(user.email, "a@b.c");
/// assert!(user.name.is_none());
/// ```
#[macro_export]
macro_rules! impl_from_row {
    ($type:ident { $($field:ident : $field_type:ty),* $(,)? }) => {
        impl $crate::FromRow for $type {
            fn from_row(row: &$crate::Row) -> $crate::QueryResult<Self> {
                Ok(Self {
                    $(
                        $field: row
                            .get::<$field_type>(stringify!($field))
                            .map_err(|e| e.with_model(stringify!($type)))?,
                    )*
                })
            }
        }

        $crate::impl_output!($type);
    };
}

/// Make [`FromRow`] types usable as single-row query outputs.
#[macro_export]
macro_rules! impl_output {
    ($($type:ty),* $(,)?) => {
        $(
            impl $crate::Output for $type {
                const SHAPE: $crate::Shape = $crate::Shape::Row;

                fn from_rows(rows: Vec<$crate::Row>, query: &str) -> $crate::QueryResult<Self> {
                    $crate::row::first_row(rows, query)
                }
            }
        )*
    };
}

/// Convert the first row, or fail with a not-found error naming `query`.
pub fn first_row<T: FromRow>(rows: Vec<Row>, query: &str) -> QueryResult<T> {
    match rows.first() {
        Some(row) => T::from_row(row),
        None => Err(QueryError::not_found(query)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        Row::new(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    #[test]
    fn test_get_missing_column() {
        let err = row(&[]).get::<i64>("id").unwrap_err();
        assert_eq!(err.context.column.as_deref(), Some("id"));
    }

    #[test]
    #[should_panic(expected = "row has 2 columns but 1 values")]
    fn test_mismatched_row_panics() {
        Row::new(vec!["id".into(), "name".into()], vec![SqlValue::Int(1)]);
    }

    #[derive(Debug)]
    struct Account {
        id: i64,
        owner: String,
    }

    crate::impl_from_row!(Account {
        id: i64,
        owner: String,
    });

    #[test]
    fn test_from_row_error_names_model() {
        let account = Account::from_row(&row(&[
            ("id", SqlValue::Int(4)),
            ("owner", SqlValue::String("ada".into())),
        ]))
        .unwrap();
        assert_eq!((account.id, account.owner.as_str()), (4, "ada"));

        let err = Account::from_row(&row(&[("id", SqlValue::Int(4))])).unwrap_err();
        assert_eq!(err.context.model.as_deref(), Some("Account"));
        assert_eq!(err.context.column.as_deref(), Some("owner"));
    }

    #[test]
    fn test_int_range_checked() {
        let r = row(&[("n", SqlValue::Int(300))]);
        assert!(r.get::<u8>("n").is_err());
        assert_eq!(r.get::<i16>("n").unwrap(), 300);
    }

    #[test]
    fn test_timestamps_from_text() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(parse_timestamp("2024-05-06T07:08:09Z").unwrap(), at);
        assert_eq!(parse_timestamp("2024-05-06 07:08:09").unwrap(), at);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_value_treats_empty_text_as_absent() {
        let r = row(&[("a", SqlValue::String(String::new())), ("b", SqlValue::Null), ("c", SqlValue::Int(0))]);
        assert!(r.get::<Value<String>>("a").unwrap().is_empty());
        assert!(r.get::<Value<i64>>("b").unwrap().is_empty());
        assert_eq!(r.get::<Value<i64>>("c").unwrap(), Value::new(0));
    }

    #[test]
    fn test_uuid_and_json() {
        let id = Uuid::new_v4();
        let r = row(&[
            ("id", SqlValue::String(id.to_string())),
            ("doc", SqlValue::String(r#"{"a":1}"#.into())),
        ]);
        assert_eq!(r.get::<Uuid>("id").unwrap(), id);
        assert_eq!(r.get::<serde_json::Value>("doc").unwrap()["a"], 1);
    }

    #[test]
    fn test_scoped_opt() {
        let r = row(&[
            ("m.id", SqlValue::Int(1)),
            ("i.model_id", SqlValue::Null),
            ("i.info", SqlValue::Null),
        ]);
        assert_eq!(r.scoped_opt::<i64>("m").unwrap(), Some(1));
        assert_eq!(r.scoped_opt::<i64>("i").unwrap(), None);
        assert_eq!(r.scoped_opt::<i64>("x").unwrap(), None);
    }

    #[test]
    fn test_first_row_not_found() {
        let err = first_row::<i64>(vec![], "countModels").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message.contains("countModels"));
    }
}
