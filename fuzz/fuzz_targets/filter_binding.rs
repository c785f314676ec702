//! Fuzz target for filter parsing and named binding.
//!
//! Arbitrary condition values are rendered into a WHERE clause and bound.
//! Every placeholder a filter emits must be bound, so binding never panics,
//! and the positional SQL must carry one `?` per bound value.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_filter_binding
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Deserialize;
use strata_query::{
    Condition, DatabaseType, Filter, IntCondition, NamedParams, StringCondition, Where, and,
    bind_named, rebind, where_clause,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FuzzFilter {
    id: IntCondition,
    name: StringCondition,
}

impl Filter for FuzzFilter {
    fn parse(&self, params: &mut NamedParams) -> String {
        and([self.id.parse(params, "t.id"), self.name.parse(params, "t.name")])
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzLeaf {
    eq: Option<i64>,
    gt: Option<i64>,
    contains: Option<String>,
    names: Vec<String>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    any: bool,
    leaves: Vec<FuzzLeaf>,
    raw: Vec<u8>,
}

impl FuzzLeaf {
    fn to_json(&self) -> serde_json::Value {
        let mut id = serde_json::Map::new();
        if let Some(eq) = self.eq {
            id.insert("eq".into(), eq.into());
        }
        if let Some(gt) = self.gt {
            id.insert("gt".into(), gt.into());
        }
        let mut name = serde_json::Map::new();
        if let Some(contains) = &self.contains {
            name.insert("contains".into(), contains.clone().into());
        }
        if !self.names.is_empty() {
            name.insert("in".into(), self.names.clone().into());
        }
        serde_json::json!({ "id": id, "name": name })
    }
}

fn check(filter: &Where<FuzzFilter>) {
    let mut params = NamedParams::new();
    let sql = format!("SELECT * FROM t {}", where_clause(filter.parse(&mut params)));
    let (positional, args) = bind_named(&sql, &params);
    let _ = rebind(&positional, DatabaseType::PostgreSQL);
    let _ = rebind(&positional, DatabaseType::SQLite);
    let expected: usize = params.iter().map(|(_, v)| v.arity()).sum();
    assert_eq!(args.len(), expected);
}

fuzz_target!(|input: FuzzInput| {
    let filters: Vec<serde_json::Value> = input.leaves.iter().map(FuzzLeaf::to_json).collect();
    let body = serde_json::json!({
        "condition": if input.any { "OR" } else { "AND" },
        "filters": filters,
    });
    if let Ok(filter) = serde_json::from_value::<Where<FuzzFilter>>(body) {
        check(&filter);
    }

    if let Ok(filter) = serde_json::from_slice::<Where<FuzzFilter>>(&input.raw) {
        check(&filter);
    }
});
