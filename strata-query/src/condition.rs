//! Single-column predicates and their typed families.
//!
//! A leaf whose value is zero or empty contributes no SQL and binds nothing.
//! That makes a zero value mean "not specified": `Eq(0_i64)` never filters
//! for zero. Wrap the payload in [`Value`] (as [`OptIntCondition`] does) when
//! an explicit zero has to be matched.
//!
//! ```rust
//! use strata_query::{Condition, IntCondition, NamedParams};
//! use strata_query::condition::Gte;
//!
//! let age = IntCondition { gte: Gte(18), ..Default::default() };
//! let mut params = NamedParams::new();
//!
//! assert_eq!(age.parse(&mut params, "user.age"), "user.age >= :user_age_0");
//! assert_eq!(params.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enumeration::Enumerable;
use crate::expr::{and, or};
use crate::param::{NamedParams, SqlValue};
use crate::value::{Value, Zero};

/// A predicate over one column.
pub trait Condition {
    /// Render the predicate for `column`, binding its values into `params`.
    ///
    /// Returns an empty string when the condition is unset.
    fn parse(&self, params: &mut NamedParams, column: &str) -> String;
}

macro_rules! comparison {
    ($(#[$doc:meta])* $name:ident, $op:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name<T>(pub T);

        impl<T: Zero + Clone + Into<SqlValue>> Condition for $name<T> {
            fn parse(&self, params: &mut NamedParams, column: &str) -> String {
                if self.0.is_zero() {
                    return String::new();
                }
                let placeholder = params.push(column, self.0.clone());
                format!(concat!("{} ", $op, " {}"), column, placeholder)
            }
        }

        impl<T: Zero> Zero for $name<T> {
            fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }
    };
}

comparison!(
    /// `column = :p`
    Eq, "="
);
comparison!(
    /// `column > :p`
    Gt, ">"
);
comparison!(
    /// `column >= :p`
    Gte, ">="
);
comparison!(
    /// `column < :p`
    Lt, "<"
);
comparison!(
    /// `column <= :p`
    Lte, "<="
);

/// `NOT(column = :p)`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ne<T>(pub T);

impl<T: Zero + Clone + Into<SqlValue>> Condition for Ne<T> {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        crate::expr::not(Eq(self.0.clone()).parse(params, column))
    }
}

impl<T: Zero> Zero for Ne<T> {
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

macro_rules! pattern {
    ($(#[$doc:meta])* $name:ident, $fmt:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl Condition for $name {
            fn parse(&self, params: &mut NamedParams, column: &str) -> String {
                if self.0.is_empty() {
                    return String::new();
                }
                let placeholder = params.push(column, format!($fmt, self.0));
                format!("{} ILIKE {}", column, placeholder)
            }
        }

        impl Zero for $name {
            fn is_zero(&self) -> bool {
                self.0.is_empty()
            }
        }
    };
}

pattern!(
    /// `column ILIKE :p`, matching `%value%`.
    Contains, "%{}%"
);
pattern!(
    /// `column ILIKE :p`, matching `value%`.
    StartsWith, "{}%"
);
pattern!(
    /// `column ILIKE :p`, matching `%value`.
    EndsWith, "%{}"
);

/// `column IN (:p)`, with the whole list bound to one parameter.
///
/// An empty list is unset rather than `IN ()`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct In<T>(pub Vec<T>);

impl<T: Clone + Into<SqlValue>> Condition for In<T> {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let placeholder = params.push(column, self.0.clone());
        format!("{} IN ({})", column, placeholder)
    }
}

impl<T> Zero for In<T> {
    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

/// `(column IS NULL OR column IN (:p))`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NullIn<T>(pub Vec<T>);

impl<T: Clone + Into<SqlValue>> Condition for NullIn<T> {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let members = In(self.0.clone()).parse(params, column);
        or([NullIs(true).parse(params, column), members])
    }
}

impl<T> Zero for NullIn<T> {
    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

/// `column IS NULL` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NullIs(pub bool);

impl Condition for NullIs {
    fn parse(&self, _params: &mut NamedParams, column: &str) -> String {
        if self.0 {
            format!("{} IS NULL", column)
        } else {
            String::new()
        }
    }
}

impl Zero for NullIs {
    fn is_zero(&self) -> bool {
        !self.0
    }
}

/// `column IS NOT NULL` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NullIsNot(pub bool);

impl Condition for NullIsNot {
    fn parse(&self, _params: &mut NamedParams, column: &str) -> String {
        if self.0 {
            format!("{} IS NOT NULL", column)
        } else {
            String::new()
        }
    }
}

impl Zero for NullIsNot {
    fn is_zero(&self) -> bool {
        !self.0
    }
}

/// Filters for text columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringCondition {
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub eq: Eq<String>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub ne: Ne<String>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub contains: Contains,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub starts: StartsWith,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub ends: EndsWith,
    #[serde(rename = "in", skip_serializing_if = "Zero::is_zero")]
    pub in_: In<String>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub null_in: NullIn<String>,
}

impl Condition for StringCondition {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        and([
            self.eq.parse(params, column),
            self.ne.parse(params, column),
            self.contains.parse(params, column),
            self.starts.parse(params, column),
            self.ends.parse(params, column),
            self.in_.parse(params, column),
            self.null_in.parse(params, column),
        ])
    }
}

/// Filters for SQL enum columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumCondition<E> {
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub eq: Eq<Option<E>>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub ne: Ne<Option<E>>,
    #[serde(rename = "in", skip_serializing_if = "Zero::is_zero")]
    pub in_: In<E>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub null_in: NullIn<E>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub null_is: NullIs,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub null_is_not: NullIsNot,
}

impl<E> Default for EnumCondition<E> {
    fn default() -> Self {
        Self {
            eq: Eq(None),
            ne: Ne(None),
            in_: In(Vec::new()),
            null_in: NullIn(Vec::new()),
            null_is: NullIs(false),
            null_is_not: NullIsNot(false),
        }
    }
}

impl<E: Enumerable> Condition for EnumCondition<E> {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        and([
            self.eq.parse(params, column),
            self.ne.parse(params, column),
            self.in_.parse(params, column),
            self.null_in.parse(params, column),
            self.null_is.parse(params, column),
            self.null_is_not.parse(params, column),
        ])
    }
}

/// Enum-like filters for plain text columns holding a closed set of values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectCondition {
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub eq: Eq<String>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub ne: Ne<String>,
    #[serde(rename = "in", skip_serializing_if = "Zero::is_zero")]
    pub in_: In<String>,
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub null_in: NullIn<String>,
}

impl Condition for SelectCondition {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        and([
            self.eq.parse(params, column),
            self.ne.parse(params, column),
            self.in_.parse(params, column),
            self.null_in.parse(params, column),
        ])
    }
}

macro_rules! range_condition {
    ($(#[$doc:meta])* $name:ident, $t:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        #[serde(default, rename_all = "camelCase")]
        pub struct $name {
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub eq: Eq<$t>,
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub ne: Ne<$t>,
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub gt: Gt<$t>,
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub gte: Gte<$t>,
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub lt: Lt<$t>,
            #[serde(skip_serializing_if = "Zero::is_zero")]
            pub lte: Lte<$t>,
        }

        impl Condition for $name {
            fn parse(&self, params: &mut NamedParams, column: &str) -> String {
                and([
                    self.eq.parse(params, column),
                    self.ne.parse(params, column),
                    self.gt.parse(params, column),
                    self.gte.parse(params, column),
                    self.lt.parse(params, column),
                    self.lte.parse(params, column),
                ])
            }
        }
    };
}

range_condition!(
    /// Filters for integer columns. Zero means "not specified".
    IntCondition, i64
);
range_condition!(
    /// Filters for floating point columns. Zero means "not specified".
    FloatCondition, f64
);
range_condition!(
    /// Filters for timestamp columns. The unix epoch means "not specified".
    TimeCondition, DateTime<Utc>
);
range_condition!(
    /// Filters for integer columns that can match zero; `null` means "not specified".
    OptIntCondition, Value<i64>
);

/// Filters for boolean columns. `false` means "not specified".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoolCondition {
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub eq: Eq<bool>,
}

impl Condition for BoolCondition {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        self.eq.parse(params, column)
    }
}

/// Filters for boolean columns that can match `false`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptBoolCondition {
    #[serde(skip_serializing_if = "Zero::is_zero")]
    pub eq: Eq<Value<bool>>,
}

impl Condition for OptBoolCondition {
    fn parse(&self, params: &mut NamedParams, column: &str) -> String {
        self.eq.parse(params, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumeration::tests::Status;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_leaves_emit_nothing() {
        let mut params = NamedParams::new();
        assert_eq!(Eq(0_i64).parse(&mut params, "id"), "");
        assert_eq!(Ne(String::new()).parse(&mut params, "name"), "");
        assert_eq!(Gt(0.0_f64).parse(&mut params, "score"), "");
        assert_eq!(Contains(String::new()).parse(&mut params, "name"), "");
        assert_eq!(In::<i64>(vec![]).parse(&mut params, "id"), "");
        assert_eq!(NullIn::<String>(vec![]).parse(&mut params, "tag"), "");
        assert_eq!(NullIs(false).parse(&mut params, "tag"), "");
        assert_eq!(Eq(false).parse(&mut params, "active"), "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_comparisons() {
        let mut params = NamedParams::new();
        assert_eq!(Eq(5_i64).parse(&mut params, "m.id"), "m.id = :m_id_0");
        assert_eq!(Ne(5_i64).parse(&mut params, "m.id"), "NOT(m.id = :m_id_1)");
        assert_eq!(Lt(2.5_f64).parse(&mut params, "score"), "score < :score_2");
        assert_eq!(Lte(3_i64).parse(&mut params, "n"), "n <= :n_3");
        assert_eq!(params.get("m_id_1"), Some(&SqlValue::Int(5)));
    }

    struct Video;

    impl crate::model::Schema for Video {
        fn fields() -> Vec<crate::model::Field> {
            vec![crate::model::Field::column("id"), crate::model::Field::column("title")]
        }
    }

    impl crate::model::Model for Video {
        fn model_name() -> &'static str {
            "video"
        }
    }

    #[test]
    fn test_quoted_columns_reach_bound_args() {
        use crate::bind::bind_named;
        use crate::model::{column_aliased, column_full, column_quoted};

        let mut params = NamedParams::new();
        let fragment = crate::expr::and([
            Eq(5_i64).parse(&mut params, &column_quoted::<Video>("id")),
            Contains("intro".into()).parse(&mut params, &column_full::<Video>("title")),
            Ne(9_i64).parse(&mut params, &column_aliased::<Video>("id")),
        ]);
        assert_eq!(params.len(), 3);
        assert!(fragment.contains(r#""video"."id" = :_video___id__0"#));

        let (sql, args) = bind_named(&fragment, &params);
        assert_eq!(
            sql,
            r#"("video"."id" = ? AND video.title ILIKE ? AND NOT("video"."id" AS "video.id" = ?))"#
        );
        assert_eq!(
            args,
            vec![SqlValue::Int(5), SqlValue::from("%intro%"), SqlValue::Int(9)]
        );
    }

    #[test]
    fn test_patterns_wrap_value_not_fragment() {
        let mut params = NamedParams::new();
        assert_eq!(Contains("ab".into()).parse(&mut params, "name"), "name ILIKE :name_0");
        assert_eq!(StartsWith("ab".into()).parse(&mut params, "name"), "name ILIKE :name_1");
        assert_eq!(EndsWith("ab".into()).parse(&mut params, "name"), "name ILIKE :name_2");
        assert_eq!(params.get("name_0"), Some(&SqlValue::from("%ab%")));
        assert_eq!(params.get("name_1"), Some(&SqlValue::from("ab%")));
        assert_eq!(params.get("name_2"), Some(&SqlValue::from("%ab")));
    }

    #[test]
    fn test_in_binds_whole_set_once() {
        let mut params = NamedParams::new();
        assert_eq!(In(vec![1_i64, 2, 3]).parse(&mut params, "id"), "id IN (:id_0)");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id_0"), Some(&SqlValue::from(vec![1_i64, 2, 3])));
    }

    #[test]
    fn test_null_in() {
        let mut params = NamedParams::new();
        assert_eq!(
            NullIn(vec!["a".to_string()]).parse(&mut params, "tag"),
            "(tag IS NULL OR tag IN (:tag_0))"
        );
    }

    #[test]
    fn test_string_condition_ands_fields() {
        let cond = StringCondition {
            eq: Eq("x".into()),
            starts: StartsWith("y".into()),
            ..Default::default()
        };
        let mut params = NamedParams::new();
        assert_eq!(
            cond.parse(&mut params, "name"),
            "(name = :name_0 AND name ILIKE :name_1)"
        );
        assert_eq!(StringCondition::default().parse(&mut params, "name"), "");
    }

    #[test]
    fn test_enum_condition_null_checks() {
        let cond = EnumCondition::<Status> {
            in_: In(vec![Status::Good, Status::Bad]),
            null_is_not: NullIsNot(true),
            ..Default::default()
        };
        let mut params = NamedParams::new();
        assert_eq!(
            cond.parse(&mut params, "type"),
            "(type IN (:type_0) AND type IS NOT NULL)"
        );
        assert_eq!(
            params.get("type_0"),
            Some(&SqlValue::List(vec!["good".into(), "bad".into()]))
        );
    }

    #[test]
    fn test_enum_condition_json() {
        let cond: EnumCondition<Status> =
            serde_json::from_str(r#"{"eq":"mid","nullIn":["bad"]}"#).unwrap();
        assert_eq!(cond.eq, Eq(Some(Status::Mid)));
        assert_eq!(cond.null_in, NullIn(vec![Status::Bad]));
        assert_eq!(
            serde_json::to_string(&cond).unwrap(),
            r#"{"eq":"mid","nullIn":["bad"]}"#
        );
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        assert_eq!(serde_json::to_string(&IntCondition::default()).unwrap(), "{}");
        let cond = SelectCondition { in_: In(vec!["a".into()]), ..Default::default() };
        assert_eq!(serde_json::to_string(&cond).unwrap(), r#"{"in":["a"]}"#);
    }

    #[test]
    fn test_time_condition() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let cond = TimeCondition { gt: Gt(at), ..Default::default() };
        let mut params = NamedParams::new();
        assert_eq!(cond.parse(&mut params, "created"), "created > :created_0");
        assert_eq!(params.get("created_0"), Some(&SqlValue::Time(at)));

        let parsed: TimeCondition = serde_json::from_str(r#"{"gt":"2024-01-02T03:04:05Z"}"#).unwrap();
        assert_eq!(parsed, cond);
    }

    #[test]
    fn test_explicit_zero_through_value() {
        let mut params = NamedParams::new();
        let cond = OptIntCondition { eq: Eq(Value::new(0)), ..Default::default() };
        assert_eq!(cond.parse(&mut params, "n"), "n = :n_0");
        assert_eq!(params.get("n_0"), Some(&SqlValue::Int(0)));

        let cond: OptBoolCondition = serde_json::from_str(r#"{"eq":false}"#).unwrap();
        assert_eq!(cond.parse(&mut params, "active"), "active = :active_1");
        assert_eq!(OptBoolCondition::default().parse(&mut params, "active"), "");
    }
}
