//! Randomized query inputs.
//!
//! Strategies for building inputs to [`QuerySuite::fuzz_query`] and
//! [`QuerySuite::fuzz_lazy_query`]. Request filters are the main target:
//! a generated [`Where`] tree mixes set and unset conditions, so the suite
//! sees the SQL shapes a real request body can produce.
//!
//! ```rust,ignore
//! let filters = fuzz::where_filters(
//!     fuzz::enum_condition::<Status>().prop_map(|status| VideoFilter { status, ..Default::default() }),
//!     4,
//! );
//! QuerySuite::new(db)
//!     .fuzz_lazy_query(queries::search_videos(), filters, 32)
//!     .run_all()
//!     .await
//!     .assert_ok();
//! ```
//!
//! [`QuerySuite::fuzz_query`]: crate::QuerySuite::fuzz_query
//! [`QuerySuite::fuzz_lazy_query`]: crate::QuerySuite::fuzz_lazy_query

use std::fmt::Debug;

use proptest::prelude::*;
use proptest::strategy::ValueTree;
use proptest::test_runner::TestRunner;

use crate::condition::{EnumCondition, Eq, In, Ne, NullIn};
use crate::enumeration::Enumerable;
use crate::expr::Op;
use crate::filter::Where;
use crate::value::Value;

/// Chance that [`value`] produces a present value.
pub const PRESENT_PROBABILITY: f64 = 0.7;

/// Either boolean operator.
pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::And), Just(Op::Or)]
}

/// An optional value, absent about a third of the time.
pub fn value<T: Debug + Clone>(inner: impl Strategy<Value = T>) -> impl Strategy<Value = Value<T>> {
    prop::option::weighted(PRESENT_PROBABILITY, inner).prop_map(Value::wrap)
}

/// An enum condition over the values of `E`.
///
/// Each operator is set half of the time. List operators take a suffix of
/// [`Enumerable::values`] starting in its first half, so they are never empty.
pub fn enum_condition<E: Enumerable + Debug>() -> impl Strategy<Value = EnumCondition<E>> {
    let values = E::values();
    let single = 0..values.len();
    let suffix = 0..(values.len() / 2).max(1);

    (
        prop::option::of(single.clone()),
        prop::option::of(single),
        prop::option::of(suffix.clone()),
        prop::option::of(suffix),
    )
        .prop_map(move |(eq, ne, in_from, null_in_from)| EnumCondition {
            eq: Eq(eq.map(|i| values[i])),
            ne: Ne(ne.map(|i| values[i])),
            in_: In(in_from.map(|i| values[i..].to_vec()).unwrap_or_default()),
            null_in: NullIn(null_in_from.map(|i| values[i..].to_vec()).unwrap_or_default()),
            ..EnumCondition::default()
        })
}

/// A filter tree of up to `max_filters` filters, joined by a random or
/// missing operator.
pub fn where_filters<F: Debug + Clone>(
    filter: impl Strategy<Value = F>,
    max_filters: usize,
) -> impl Strategy<Value = Where<F>> {
    (
        prop::option::of(op()),
        prop::collection::vec(filter, 0..=max_filters),
    )
        .prop_map(|(condition, filters)| Where { condition, filters })
}

/// Draw `count` values from `strategy`.
///
/// Uses a deterministic runner, so a failing case reproduces on every run.
pub fn samples<S: Strategy>(strategy: &S, count: usize) -> Vec<S::Value> {
    let mut runner = TestRunner::deterministic();
    (0..count)
        .filter_map(|_| strategy.new_tree(&mut runner).ok())
        .map(|tree| tree.current())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::bind_named;
    use crate::condition::Condition;
    use crate::enumeration::tests::Status;
    use crate::param::NamedParams;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_samples_are_reproducible() {
        let strategy = enum_condition::<Status>();
        assert_eq!(samples(&strategy, 16), samples(&strategy, 16));
        assert_eq!(samples(&strategy, 16).len(), 16);
    }

    proptest! {
        #[test]
        fn prop_enum_lists_are_suffixes(cond in enum_condition::<Status>()) {
            let values = Status::values();
            for list in [&cond.in_.0, &cond.null_in.0] {
                if !list.is_empty() {
                    prop_assert!(list.len() > values.len() / 2);
                    prop_assert_eq!(list.as_slice(), &values[values.len() - list.len()..]);
                }
            }
        }

        #[test]
        fn prop_enum_condition_binds_every_placeholder(cond in enum_condition::<Status>()) {
            let mut params = NamedParams::new();
            let fragment = cond.parse(&mut params, "video.status");
            let (sql, args) = bind_named(&fragment, &params);
            prop_assert_eq!(sql.matches('?').count(), args.len());
            prop_assert_eq!(fragment.is_empty(), params.is_empty());
        }

        #[test]
        fn prop_where_filters_stay_within_bound(tree in where_filters(enum_condition::<Status>(), 3)) {
            prop_assert!(tree.filters.len() <= 3);
        }
    }
}
