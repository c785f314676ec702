//! Closed sets of string values stored in SQL enum columns.

/// A Rust enum mapped onto a SQL enum (or text) column.
pub trait Enumerable: Sized + Copy + PartialEq + Send + Sync + Into<crate::SqlValue> + 'static {
    /// Every value, in declaration order. Must not be empty.
    fn values() -> &'static [Self];

    /// The SQL text of this value.
    fn as_str(&self) -> &'static str;

    /// Parse SQL text back into a value.
    fn parse_str(text: &str) -> Option<Self> {
        Self::values().iter().copied().find(|v| v.as_str() == text)
    }
}

/// Declare a string-backed enum implementing [`Enumerable`].
///
/// ```rust
/// strata_query::enumeration! {
///     #[derive(serde::Serialize, serde::Deserialize)]
///     #[serde(rename_all = "lowercase")]
///     pub enum Tier {
///         Free => "free",
///         Paid => "paid",
///     }
/// }
///
/// use strata_query::Enumerable;
/// assert_eq!(Tier::values(), &[Tier::Free, Tier::Paid]);
/// assert_eq!(Tier::parse_str("paid"), Some(Tier::Paid));
/// assert_eq!(Tier::Free.to_string(), "free");
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::Enumerable for $name {
            fn values() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::Enumerable::as_str(self))
            }
        }

        impl ::std::convert::From<$name> for $crate::SqlValue {
            fn from(v: $name) -> Self {
                $crate::SqlValue::String($crate::Enumerable::as_str(&v).to_string())
            }
        }

        impl $crate::FromValue for $name {
            fn from_value(value: &$crate::SqlValue) -> $crate::QueryResult<Self> {
                let text = <String as $crate::FromValue>::from_value(value)?;
                <Self as $crate::Enumerable>::parse_str(&text).ok_or_else(|| {
                    $crate::QueryError::deserialization(format!(
                        "{:?} is not a valid {}",
                        text,
                        stringify!($name)
                    ))
                })
            }
        }

        impl $crate::Zero for $name {
            fn is_zero(&self) -> bool {
                false
            }
        }
    };
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    crate::enumeration! {
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Status {
            Good => "good",
            Mid => "mid",
            Bad => "bad",
        }
    }

    #[test]
    fn test_values_in_declaration_order() {
        assert_eq!(Status::values(), &[Status::Good, Status::Mid, Status::Bad]);
    }

    #[test]
    fn test_parse_str() {
        assert_eq!(Status::parse_str("mid"), Some(Status::Mid));
        assert_eq!(Status::parse_str(""), None);
        assert_eq!(Status::parse_str("MID"), None);
    }

    #[test]
    fn test_into_sql_value() {
        assert_eq!(crate::SqlValue::from(Status::Bad), crate::SqlValue::String("bad".into()));
    }
}
