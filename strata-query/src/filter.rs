//! Row filters and the `Where` combinator.
//!
//! A filter groups the conditions of one model; [`Where`] joins filters with
//! `AND` or `OR` and is itself a filter, so request bodies can nest freely:
//!
//! ```json
//! { "condition": "OR", "filters": [ { "name": { "eq": "a" } }, { "condition": "AND", "filters": [] } ] }
//! ```

use serde::{Deserialize, Serialize};

use crate::expr::{Op, cond};
use crate::param::NamedParams;

/// A set of conditions over one row.
pub trait Filter {
    /// Render the filter, binding its values into `params`.
    ///
    /// Returns an empty string when no condition is set.
    fn parse(&self, params: &mut NamedParams) -> String;
}

/// A boolean combination of filters. The operator defaults to `AND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Where<F> {
    /// Operator joining the filters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Op>,
    /// The filters to join.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<F>,
}

impl<F> Default for Where<F> {
    fn default() -> Self {
        Self {
            condition: None,
            filters: Vec::new(),
        }
    }
}

impl<F> Where<F> {
    /// Join `filters` with `AND`.
    pub fn all(filters: impl IntoIterator<Item = F>) -> Self {
        Self {
            condition: Some(Op::And),
            filters: filters.into_iter().collect(),
        }
    }

    /// Join `filters` with `OR`.
    pub fn any(filters: impl IntoIterator<Item = F>) -> Self {
        Self {
            condition: Some(Op::Or),
            filters: filters.into_iter().collect(),
        }
    }

    /// Append a filter.
    pub fn push(&mut self, filter: F) -> &mut Self {
        self.filters.push(filter);
        self
    }
}

impl<F: Filter> Filter for Where<F> {
    fn parse(&self, params: &mut NamedParams) -> String {
        let op = self.condition.unwrap_or_default();
        let parts: Vec<String> = self.filters.iter().map(|f| f.parse(params)).collect();
        cond(op, parts)
    }
}

impl<F: Filter> Filter for Box<F> {
    fn parse(&self, params: &mut NamedParams) -> String {
        (**self).parse(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, Eq, In, IntCondition, StringCondition};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct ModelFilter {
        id: IntCondition,
        name: StringCondition,
    }

    impl Filter for ModelFilter {
        fn parse(&self, params: &mut NamedParams) -> String {
            crate::expr::and([
                self.id.parse(params, "model.id"),
                self.name.parse(params, "model.name"),
            ])
        }
    }

    /// Either a leaf filter or a nested group.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    enum Node {
        Leaf(ModelFilter),
        Group(Where<Node>),
    }

    impl Filter for Node {
        fn parse(&self, params: &mut NamedParams) -> String {
            match self {
                Node::Leaf(f) => f.parse(params),
                Node::Group(w) => w.parse(params),
            }
        }
    }

    fn by_id(id: i64) -> ModelFilter {
        ModelFilter {
            id: IntCondition { eq: Eq(id), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_operator_is_and() {
        let w = Where { condition: None, filters: vec![by_id(1), by_id(2)] };
        let mut params = NamedParams::new();
        assert_eq!(w.parse(&mut params), "(model.id = :model_id_0 AND model.id = :model_id_1)");
    }

    #[test]
    fn test_or_with_single_filter_is_unwrapped() {
        let w = Where::any([by_id(1), ModelFilter::default()]);
        let mut params = NamedParams::new();
        assert_eq!(w.parse(&mut params), "model.id = :model_id_0");
    }

    #[test]
    fn test_empty_tree_is_empty() {
        let mut params = NamedParams::new();
        assert_eq!(Where::<ModelFilter>::default().parse(&mut params), "");
        assert_eq!(Where::any([ModelFilter::default(), ModelFilter::default()]).parse(&mut params), "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_groups_from_json() {
        let body = r#"{
            "condition": "OR",
            "filters": [
                { "name": { "in": ["a", "b"] } },
                { "condition": "AND", "filters": [ { "id": { "gt": 3 } }, { "id": { "lt": 9 } } ] }
            ]
        }"#;
        let tree: Where<Node> = serde_json::from_str(body).unwrap();
        let mut params = NamedParams::new();
        assert_eq!(
            tree.parse(&mut params),
            "(model.name IN (:model_name_0) OR (model.id > :model_id_1 AND model.id < :model_id_2))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_serialization_omits_empty() {
        let w: Where<ModelFilter> = Where::default();
        assert_eq!(serde_json::to_string(&w).unwrap(), "{}");

        let mut w = Where::all([]);
        w.push(ModelFilter { name: StringCondition { in_: In(vec!["x".into()]), ..Default::default() }, ..Default::default() });
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.starts_with(r#"{"condition":"AND","filters":[{"#));
    }
}
