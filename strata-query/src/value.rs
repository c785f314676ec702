//! Optional values that tell "not provided" apart from "explicitly zero".
//!
//! ```rust
//! use strata_query::Value;
//!
//! let unset: Value<i64> = serde_json::from_str("null").unwrap();
//! assert!(unset.is_empty());
//!
//! let zero: Value<i64> = serde_json::from_str("0").unwrap();
//! assert_eq!(zero.get(), Some(&0));
//!
//! assert_eq!(serde_json::to_string(&Value::<i64>::empty()).unwrap(), "null");
//! assert!(Value::from_value(0_i64).is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::param::SqlValue;

/// Values that have a "zero", meaning "not specified" in filters.
pub trait Zero {
    /// Whether this is the zero value.
    fn is_zero(&self) -> bool;
}

macro_rules! zero_by_default {
    ($($t:ty),*) => {
        $(
            impl Zero for $t {
                fn is_zero(&self) -> bool {
                    *self == <$t>::default()
                }
            }
        )*
    };
}

zero_by_default!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, bool, Uuid);

impl Zero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Zero for &str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Zero for DateTime<Utc> {
    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH
    }
}

impl<T> Zero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Zero for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T> Zero for Value<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// A value that may be absent.
///
/// Absent values serialize as `null` and bind as SQL `NULL`; a present value
/// keeps its payload even when that payload is the zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value<T> {
    inner: Option<T>,
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<T> Value<T> {
    /// A present value.
    pub fn new(value: T) -> Self {
        Self { inner: Some(value) }
    }

    /// An absent value.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Build from an `Option`.
    pub fn wrap(value: Option<T>) -> Self {
        Self { inner: value }
    }

    /// Build from a value, treating the zero value as absent.
    pub fn from_value(value: T) -> Self
    where
        T: Zero,
    {
        if value.is_zero() {
            Self::empty()
        } else {
            Self::new(value)
        }
    }

    /// Build from a borrowed optional value.
    pub fn from_ref(value: Option<&T>) -> Self
    where
        T: Clone,
    {
        Self {
            inner: value.cloned(),
        }
    }

    /// Whether a value is present.
    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    /// Whether the value is absent.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrow the value if present.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Replace the value, making it present.
    pub fn set(&mut self, value: T) {
        self.inner = Some(value);
    }

    /// Make the value absent.
    pub fn clear(&mut self) {
        self.inner = None;
    }

    /// Take the value out, leaving it absent.
    pub fn take(&mut self) -> Option<T> {
        self.inner.take()
    }

    /// The value if present, otherwise `default`.
    pub fn or(self, default: T) -> T {
        self.inner.unwrap_or(default)
    }

    /// The value if present, otherwise `T::default()`.
    pub fn or_zero(self) -> T
    where
        T: Default,
    {
        self.inner.unwrap_or_default()
    }

    /// Borrow as an `Option`.
    pub fn as_option(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Convert into an `Option`.
    pub fn into_option(self) -> Option<T> {
        self.inner
    }

    /// Apply `f` to a present value.
    pub fn map<O>(self, f: impl FnOnce(T) -> O) -> Value<O> {
        Value {
            inner: self.inner.map(f),
        }
    }

    /// Apply `f` to a present value, flattening the result.
    pub fn and_then<O>(self, f: impl FnOnce(T) -> Value<O>) -> Value<O> {
        match self.inner {
            Some(v) => f(v),
            None => Value::empty(),
        }
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        Self::wrap(value)
    }
}

impl<T> From<Value<T>> for Option<T> {
    fn from(value: Value<T>) -> Self {
        value.inner
    }
}

impl<T: Into<SqlValue>> From<Value<T>> for SqlValue {
    fn from(value: Value<T>) -> Self {
        match value.inner {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.inner {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::wrap)
    }
}

/// The first present value, or an absent one.
pub fn first<T>(values: impl IntoIterator<Item = Value<T>>) -> Value<T> {
    values
        .into_iter()
        .find(Value::is_present)
        .unwrap_or_default()
}

/// The value if present, otherwise `default`.
pub fn coalesce<T>(value: Option<T>, default: T) -> T {
    value.unwrap_or(default)
}

/// Apply `f` only when a value is present.
pub fn map_skip_empty<I, O>(value: Option<I>, f: impl FnOnce(I) -> O) -> Option<O> {
    value.map(f)
}

/// The first `Some` in `values`.
pub fn first_non_empty<T>(values: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    values.into_iter().flatten().next()
}

/// Whether every element of `values` is `None`.
pub fn all_empty<T>(values: impl IntoIterator<Item = Option<T>>) -> bool {
    first_non_empty(values).is_none()
}
