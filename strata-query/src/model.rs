//! Column names derived from registered model schemas.
//!
//! Models describe their columns once through [`Schema::fields`]. Nested
//! structs are declared with [`Field::nested`] (their columns are prefixed
//! with the nested tag) or [`Field::embedded`] (their columns are flattened
//! into the parent). Scalar-like types such as timestamps are plain columns.
//!
//! ```rust
//! use strata_query::model::{self, Field, Model, Schema};
//!
//! struct User;
//!
//! impl Schema for User {
//!     fn fields() -> Vec<Field> {
//!         vec![Field::column("id"), Field::column("email")]
//!     }
//! }
//!
//! impl Model for User {
//!     fn model_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! assert_eq!(model::columns::<User>(&[]), vec!["id", "email"]);
//! assert_eq!(model::column_full::<User>("email"), "users.email");
//! assert_eq!(model::column_quoted::<User>("id"), r#""users"."id""#);
//! ```

use std::collections::HashMap;

use crate::sql::escape_identifier;

/// One field of a schema.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    /// A column.
    Column(&'static str),
    /// A nested struct; tagged ones prefix their columns with the tag.
    Nested {
        /// Prefix for the nested columns, or `None` to flatten them.
        tag: Option<&'static str>,
        /// The nested schema.
        fields: fn() -> Vec<Field>,
    },
}

impl Field {
    /// A plain column.
    pub const fn column(tag: &'static str) -> Self {
        Self::Column(tag)
    }

    /// A nested struct whose columns are prefixed with `tag`.
    pub fn nested<S: Schema>(tag: &'static str) -> Self {
        Self::Nested {
            tag: Some(tag),
            fields: S::fields,
        }
    }

    /// A nested struct whose columns belong to the parent.
    pub fn embedded<S: Schema>() -> Self {
        Self::Nested {
            tag: None,
            fields: S::fields,
        }
    }
}

/// A struct whose fields map onto SQL columns.
pub trait Schema {
    /// The fields in declaration order.
    fn fields() -> Vec<Field>;
}

/// A schema backed by a table or view.
pub trait Model: Schema {
    /// Name of the table or view.
    fn model_name() -> &'static str;
}

/// Name of the table or view behind `M`.
pub fn model_name<M: Model>() -> &'static str {
    M::model_name()
}

/// How a column is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `column`
    Simple,
    /// `model.column`
    Full,
    /// `"model"."column"`
    Quoted,
    /// `"model"."column" AS "model.column"`
    Aliased,
    /// `model.column AS "model.column"`, for dialects without quoted identifiers.
    MyAliased,
}

/// Write `column` qualified by `prefix` in the given style.
pub fn serialize(style: Style, prefix: &str, column: &str) -> String {
    match style {
        Style::Simple => column.to_string(),
        Style::Full => format!("{}.{}", prefix, column),
        Style::Quoted => format!("{}.{}", escape_identifier(prefix), escape_identifier(column)),
        Style::Aliased => format!(
            "{}.{} AS {}",
            escape_identifier(prefix),
            escape_identifier(column),
            escape_identifier(&format!("{}.{}", prefix, column))
        ),
        Style::MyAliased => format!(
            "{}.{} AS {}",
            prefix,
            column,
            escape_identifier(&format!("{}.{}", prefix, column))
        ),
    }
}

fn find(fields: &[Field], name: &str) -> Option<&'static str> {
    fields.iter().find_map(|field| match *field {
        Field::Column(tag) if tag == name => Some(tag),
        Field::Nested { tag: None, fields } => find(&fields(), name),
        _ => None,
    })
}

fn collect(
    out: &mut Vec<String>,
    fields: &[Field],
    prefix: &str,
    style: Style,
    overrides: Option<&HashMap<String, String>>,
) {
    for field in fields {
        match *field {
            Field::Nested { tag, fields } => {
                collect(out, &fields(), tag.unwrap_or(prefix), style, overrides);
            }
            Field::Column(tag) => {
                let qualified = if prefix.is_empty() {
                    tag.to_string()
                } else {
                    format!("{}.{}", prefix, tag)
                };

                if let Some(replacement) = overrides.and_then(|o| o.get(&qualified)) {
                    out.push(replacement.clone());
                    continue;
                }

                let column = match style {
                    Style::Aliased | Style::MyAliased if !prefix.is_empty() => {
                        serialize(style, prefix, tag)
                    }
                    _ => qualified,
                };
                out.push(column);
            }
        }
    }
}

/// Assert that `name` is a column of `M` and return it.
///
/// # Panics
///
/// If `M` has no such column; that is a programming error.
pub fn column<M: Model>(name: &str) -> String {
    match find(&M::fields(), name) {
        Some(tag) => tag.to_string(),
        None => panic!("model `{}` has no column `{}`", M::model_name(), name),
    }
}

/// [`column`], qualified with the model name: `model.column`.
pub fn column_full<M: Model>(name: &str) -> String {
    serialize(Style::Full, M::model_name(), &column::<M>(name))
}

/// [`column`], qualified and quoted: `"model"."column"`.
pub fn column_quoted<M: Model>(name: &str) -> String {
    serialize(Style::Quoted, M::model_name(), &column::<M>(name))
}

/// [`column`], qualified and aliased: `"model"."column" AS "model.column"`.
pub fn column_aliased<M: Model>(name: &str) -> String {
    serialize(Style::Aliased, M::model_name(), &column::<M>(name))
}

/// [`column`], qualified and aliased for MySQL: `model.column AS "model.column"`.
pub fn column_my_aliased<M: Model>(name: &str) -> String {
    serialize(Style::MyAliased, M::model_name(), &column::<M>(name))
}

fn columns_styled<M: Model>(style: Style, names: &[&str]) -> Vec<String> {
    let mut all = Vec::new();
    collect(&mut all, &M::fields(), "", Style::Simple, None);

    let selected: Vec<String> = if names.is_empty() {
        all
    } else {
        for name in names {
            assert!(
                all.iter().any(|c| c == name),
                "model `{}` has no column `{}`",
                M::model_name(),
                name
            );
        }
        names.iter().map(|n| n.to_string()).collect()
    };

    selected
        .iter()
        .map(|c| serialize(style, M::model_name(), c))
        .collect()
}

/// Columns of `M`; all of them when `names` is empty, otherwise `names`
/// after asserting each exists.
pub fn columns<M: Model>(names: &[&str]) -> Vec<String> {
    columns_styled::<M>(Style::Simple, names)
}

/// [`columns`] as `model.column`.
pub fn columns_full<M: Model>(names: &[&str]) -> Vec<String> {
    columns_styled::<M>(Style::Full, names)
}

/// [`columns`] as `"model"."column"`.
pub fn columns_quoted<M: Model>(names: &[&str]) -> Vec<String> {
    columns_styled::<M>(Style::Quoted, names)
}

/// [`columns`] as `"model"."column" AS "model.column"`.
pub fn columns_aliased<M: Model>(names: &[&str]) -> Vec<String> {
    columns_styled::<M>(Style::Aliased, names)
}

/// [`columns`] as `model.column AS "model.column"`.
pub fn columns_my_aliased<M: Model>(names: &[&str]) -> Vec<String> {
    columns_styled::<M>(Style::MyAliased, names)
}

/// Every column of `S`, with nested columns aliased by their dotted path.
///
/// `overrides` replaces entries keyed by their qualified name
/// (`prefix.column`), e.g. to select a computed expression instead.
pub fn extract<S: Schema>(overrides: Option<&HashMap<String, String>>) -> Vec<String> {
    let mut out = Vec::new();
    collect(&mut out, &S::fields(), "", Style::Aliased, overrides);
    out
}

/// [`extract`] for dialects without quoted identifiers.
pub fn extract_my<S: Schema>(overrides: Option<&HashMap<String, String>>) -> Vec<String> {
    let mut out = Vec::new();
    collect(&mut out, &S::fields(), "", Style::MyAliased, overrides);
    out
}

/// Join columns into a select list.
pub fn join<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",\n\t")
}

/// Concatenate column lists.
pub fn concat(lists: impl IntoIterator<Item = Vec<String>>) -> Vec<String> {
    lists.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Audit;

    impl Schema for Audit {
        fn fields() -> Vec<Field> {
            vec![Field::column("created_at"), Field::column("updated_at")]
        }
    }

    struct Item;

    impl Schema for Item {
        fn fields() -> Vec<Field> {
            vec![Field::column("id"), Field::column("name"), Field::embedded::<Audit>()]
        }
    }

    impl Model for Item {
        fn model_name() -> &'static str {
            "item"
        }
    }

    struct Tag;

    impl Schema for Tag {
        fn fields() -> Vec<Field> {
            vec![Field::column("item_id"), Field::column("label")]
        }
    }

    impl Model for Tag {
        fn model_name() -> &'static str {
            "tag"
        }
    }

    struct ItemFull;

    impl Schema for ItemFull {
        fn fields() -> Vec<Field> {
            vec![Field::nested::<Item>("item"), Field::nested::<Tag>("tag")]
        }
    }

    #[test]
    fn test_column_finds_embedded() {
        assert_eq!(column::<Item>("updated_at"), "updated_at");
        assert_eq!(column_full::<Item>("id"), "item.id");
        assert_eq!(column_aliased::<Item>("id"), r#""item"."id" AS "item.id""#);
        assert_eq!(column_my_aliased::<Item>("id"), r#"item.id AS "item.id""#);
    }

    #[test]
    #[should_panic(expected = "model `item` has no column `nope`")]
    fn test_column_missing_panics() {
        column::<Item>("nope");
    }

    #[test]
    fn test_columns_all_and_subset() {
        assert_eq!(columns::<Item>(&[]), vec!["id", "name", "created_at", "updated_at"]);
        assert_eq!(columns_full::<Item>(&["name", "id"]), vec!["item.name", "item.id"]);
        assert_eq!(columns_quoted::<Tag>(&["label"]), vec![r#""tag"."label""#]);
    }

    #[test]
    #[should_panic]
    fn test_columns_subset_must_exist() {
        columns_my_aliased::<Tag>(&["label", "missing"]);
    }

    #[test]
    fn test_extract_nested() {
        assert_eq!(
            extract::<ItemFull>(None),
            vec![
                r#""item"."id" AS "item.id""#,
                r#""item"."name" AS "item.name""#,
                r#""item"."created_at" AS "item.created_at""#,
                r#""item"."updated_at" AS "item.updated_at""#,
                r#""tag"."item_id" AS "tag.item_id""#,
                r#""tag"."label" AS "tag.label""#,
            ]
        );
    }

    #[test]
    fn test_extract_my_with_overrides() {
        let overrides = HashMap::from([(
            "tag.label".to_string(),
            r#"UPPER(tag.label) AS "tag.label""#.to_string(),
        )]);
        let cols = extract_my::<ItemFull>(Some(&overrides));
        assert_eq!(cols[0], r#"item.id AS "item.id""#);
        assert_eq!(cols[5], r#"UPPER(tag.label) AS "tag.label""#);
    }

    #[test]
    fn test_join_and_concat() {
        let cols = concat([columns::<Tag>(&[]), vec!["1".to_string()]]);
        assert_eq!(join(&cols), "item_id,\n\tlabel,\n\t1");
    }
}
