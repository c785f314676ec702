//! Sort order and sort descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Ordered `(column, direction)` pairs for a paged query.
///
/// Entries without a direction are kept for declaration order but skipped
/// when rendering, so a request struct can map every sortable column and
/// leave the unrequested ones unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sorting {
    entries: Vec<(String, Option<SortOrder>)>,
}

impl Sorting {
    /// An empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by `column` in `order`, if set.
    pub fn by(mut self, column: impl Into<String>, order: Option<SortOrder>) -> Self {
        self.entries.push((column.into(), order));
        self
    }

    /// Sort ascending by `column`.
    pub fn asc(self, column: impl Into<String>) -> Self {
        self.by(column, Some(SortOrder::Asc))
    }

    /// Sort descending by `column`.
    pub fn desc(self, column: impl Into<String>) -> Self {
        self.by(column, Some(SortOrder::Desc))
    }

    /// Whether no entry has a direction.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, order)| order.is_none())
    }

    /// The `ORDER BY` list, without the keyword.
    pub fn to_sql(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(column, order)| order.map(|o| format!("{} {}", column, o.as_sql())))
            .collect::<Vec<_>>()
            .join(",\n\t")
    }
}

impl<C: Into<String>> FromIterator<(C, Option<SortOrder>)> for Sorting {
    fn from_iter<I: IntoIterator<Item = (C, Option<SortOrder>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Sorting::new(), |sorting, (column, order)| sorting.by(column, order))
    }
}
