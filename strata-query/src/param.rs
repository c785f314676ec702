//! Bound values, the named-parameter map, and query input types.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::fmt;
use uuid::Uuid;

use crate::enumeration::Enumerable;
use crate::error::QueryError;

/// A value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// JSON document.
    Json(serde_json::Value),
    /// UTC timestamp.
    Time(DateTime<Utc>),
    /// UUID.
    Uuid(Uuid),
    /// List of values, expanded into `?, ?, ?` at bind time.
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Number of placeholders this value occupies once expanded.
    pub fn arity(&self) -> usize {
        match self {
            Self::List(items) if !items.is_empty() => items.len(),
            _ => 1,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Json(v) => write!(f, "{}", v),
            Self::Time(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Uuid(v) => write!(f, "{}", v),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! sql_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    Self::Int(v as i64)
                }
            }
        )*
    };
}

sql_value_from_int!(i8, i16, i32, i64, u16, u32);

impl TryFrom<u64> for SqlValue {
    type Error = QueryError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v)
            .map(Self::Int)
            .map_err(|_| QueryError::invalid_input("integer", format!("{} does not fit in i64", v)))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SqlValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Named parameters collected while building a query.
///
/// Filters insert generated names through [`NamedParams::push`]; query inputs
/// insert their own field names through [`NamedParams::set`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams {
    values: IndexMap<String, SqlValue>,
}

impl NamedParams {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under a name derived from `column` and return its placeholder.
    ///
    /// The name is the column with every character outside `[A-Za-z0-9_]`
    /// replaced by `_`, suffixed with the number of parameters already bound,
    /// so it is unique within the map and a valid placeholder for quoted or
    /// qualified columns alike.
    pub fn push(&mut self, column: &str, value: impl Into<SqlValue>) -> String {
        let stem: String = column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let name = format!("{}_{}", stem, self.values.len());
        let placeholder = format!(":{}", name);
        self.values.insert(name, value.into());
        placeholder
    }

    /// Set a parameter by its exact name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`NamedParams::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameter has been bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Input of a [`crate::Query`].
///
/// Implementors write each field under the name used by the `:name`
/// placeholders of the query template.
pub trait Params: Send + Sync {
    /// Marks the "no input" type; see [`Void`].
    const IS_VOID: bool = false;

    /// Write every field into `params`.
    fn bind(&self, params: &mut NamedParams);

    /// Normalise the input before binding.
    ///
    /// Implementations call the helpers in this module so that empty lists
    /// never render as `IN ()` and enum columns never receive a blank value.
    /// Must be idempotent.
    fn sanitize(&mut self) {}
}

/// Marker for queries that take no input or produce no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Void;

impl Params for Void {
    const IS_VOID: bool = true;

    fn bind(&self, _params: &mut NamedParams) {}
}

impl Params for NamedParams {
    fn bind(&self, params: &mut NamedParams) {
        for (name, value) in self.iter() {
            params.set(name, value.clone());
        }
    }
}

/// Push a default element into an empty list.
pub fn grow_empty<T: Default>(values: &mut Vec<T>) {
    if values.is_empty() {
        values.push(T::default());
    }
}

/// Replace empty JSON text with an empty object.
pub fn fill_empty_json(text: &mut String) {
    if text.is_empty() {
        text.push_str("{}");
    }
}

/// Replace empty raw JSON bytes with an empty object.
pub fn fill_empty_bytes(bytes: &mut Vec<u8>) {
    if bytes.is_empty() {
        bytes.extend_from_slice(b"{}");
    }
}

/// Default an unset enum to the first declared value.
pub fn default_enum<E: Enumerable>(value: &mut Option<E>) {
    if value.is_none() {
        *value = E::values().first().copied();
    }
}

/// Force enum text that is blank or not one of `E`'s values to the first value.
pub fn default_enum_text<E: Enumerable>(text: &mut String) {
    if E::parse_str(text).is_some() {
        return;
    }
    let values = E::values();
    assert!(!values.is_empty(), "enumeration has no values");
    *text = values[0].as_str().to_string();
}
