//! Offset pagination and paged results.
//!
//! ```rust
//! use strata_query::{Page, Pagination};
//!
//! let page = Page::build(vec!["a", "b"], 25, Pagination::new(10, 20));
//! assert_eq!(page.pages_count, 3);
//! assert_eq!(page.page_index, 2);
//!
//! // A zero size means "everything on one page".
//! let all = Page::build((), 25, Pagination::new(0, 0));
//! assert_eq!(all.pages_count, 1);
//! ```

use serde::{Deserialize, Serialize};

/// How to query a [`Page`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Items per page; zero means all items.
    #[serde(default)]
    pub size: u64,
    /// Items to skip.
    #[serde(default)]
    pub skip: u64,
}

impl Pagination {
    /// Create a pagination request.
    pub fn new(size: u64, skip: u64) -> Self {
        Self { size, skip }
    }

    /// The `index`-th page (0-based) of `size` items.
    pub fn page(index: u64, size: u64) -> Self {
        Self {
            size,
            skip: index.saturating_mul(size),
        }
    }

    /// LIMIT to bind for a result set of `total` rows.
    pub fn limit(&self, total: u64) -> u64 {
        if self.size == 0 { total } else { self.size }
    }
}

/// A page of items with its position in the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items of this page.
    pub items: T,
    /// Rows matched by the unpaged query.
    pub total: u64,
    /// Number of pages.
    pub pages_count: u64,
    /// Index of this page.
    pub page_index: u64,
}

impl<T> Page<T> {
    /// Assemble a page, computing the counters from `total` and `pagination`.
    pub fn build(items: T, total: u64, pagination: Pagination) -> Self {
        let (pages_count, page_index) = page_meta(total, pagination);
        Self {
            items,
            total,
            pages_count,
            page_index,
        }
    }

    /// Transform the items, keeping the counters.
    pub fn map<O>(self, f: impl FnOnce(T) -> O) -> Page<O> {
        Page {
            items: f(self.items),
            total: self.total,
            pages_count: self.pages_count,
            page_index: self.page_index,
        }
    }
}

/// `(pages_count, page_index)` for `total` rows.
///
/// Both are ceilings of the division by the page size; a zero size is taken
/// as `total`, and an empty result has no pages.
pub fn page_meta(total: u64, pagination: Pagination) -> (u64, u64) {
    let size = pagination.limit(total);
    if size == 0 {
        return (0, 0);
    }
    (total.div_ceil(size), pagination.skip.div_ceil(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_division() {
        assert_eq!(page_meta(20, Pagination::new(10, 10)), (2, 1));
    }

    #[test]
    fn test_partial_last_page() {
        assert_eq!(page_meta(21, Pagination::new(10, 15)), (3, 2));
    }

    #[test]
    fn test_zero_size_is_single_page() {
        assert_eq!(page_meta(7, Pagination::new(0, 0)), (1, 0));
        assert_eq!(Pagination::new(0, 0).limit(7), 7);
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(page_meta(0, Pagination::new(0, 0)), (0, 0));
        assert_eq!(page_meta(0, Pagination::new(10, 0)), (0, 0));
    }

    #[test]
    fn test_page_json() {
        let page = Page::build(vec![1, 2], 2, Pagination::new(10, 0));
        assert_eq!(
            serde_json::to_string(&page).unwrap(),
            r#"{"items":[1,2],"total":2,"pagesCount":1,"pageIndex":0}"#
        );
        let p: Pagination = serde_json::from_str(r#"{"size":5}"#).unwrap();
        assert_eq!(p, Pagination::new(5, 0));
    }

    #[test]
    fn test_page_constructor() {
        assert_eq!(Pagination::page(3, 25), Pagination::new(25, 75));
    }

    proptest! {
        #[test]
        fn prop_counters_are_ceilings(total in 0u64..10_000, size in 1u64..500, skip in 0u64..10_000) {
            let (pages, index) = page_meta(total, Pagination::new(size, skip));
            prop_assert_eq!(pages, (total + size - 1) / size);
            prop_assert_eq!(index, (skip + size - 1) / size);
        }

        #[test]
        fn prop_zero_size_single_page(total in 0u64..10_000) {
            let (pages, _) = page_meta(total, Pagination::new(0, 0));
            prop_assert_eq!(pages, if total > 0 { 1 } else { 0 });
        }
    }
}
