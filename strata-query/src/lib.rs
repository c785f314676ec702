//! # strata-query
//!
//! Typed SQL templating for hand-written queries.
//!
//! This crate provides:
//! - [`Value<T>`], an optional value that tells "absent" from "zero"
//! - composable filter conditions that only emit SQL when set
//! - [`Where<F>`] trees joined by `AND`/`OR`, deserializable from request bodies
//! - column lists derived from registered model schemas
//! - [`Query`] and [`LazyQuery`] descriptors with named parameters and pagination
//! - a structured error taxonomy and a smoke-test harness for registered queries
//!
//! ## Conditions and filters
//!
//! A condition left at its zero value contributes nothing, so a filter can be
//! deserialized straight from a request and parsed into a WHERE clause:
//!
//! ```rust
//! use serde::Deserialize;
//! use strata_query::{
//!     Condition, Filter, IntCondition, NamedParams, StringCondition, Where, and, where_clause,
//! };
//!
//! #[derive(Default, Deserialize)]
//! #[serde(default)]
//! struct UserFilter {
//!     id: IntCondition,
//!     email: StringCondition,
//! }
//!
//! impl Filter for UserFilter {
//!     fn parse(&self, params: &mut NamedParams) -> String {
//!         and([self.id.parse(params, "users.id"), self.email.parse(params, "users.email")])
//!     }
//! }
//!
//! let filter: Where<UserFilter> = serde_json::from_str(
//!     r#"{"condition":"OR","filters":[{"id":{"gt":10}},{"email":{"contains":"@example.com"}}]}"#,
//! )
//! .unwrap();
//!
//! let mut params = NamedParams::new();
//! let clause = where_clause(filter.parse(&mut params));
//! assert_eq!(clause, "WHERE (users.id > :users_id_0 OR users.email ILIKE :users_email_1)");
//! assert_eq!(params.len(), 2);
//! ```
//!
//! ## Queries
//!
//! ```rust,ignore
//! use strata_query::{Query, Void, Pagination, Sorting};
//!
//! let list: Query<Void, Vec<User>> = Query::new("listUsers", "SELECT id, email FROM users");
//! let page = list.paged(&db, vec![], Pagination::new(20, 0), &Sorting::new().desc("id")).await?;
//! ```

pub mod bind;
pub mod condition;
pub mod enumeration;
pub mod error;
pub mod expr;
pub mod filter;
#[cfg(any(test, feature = "fuzz"))]
pub mod fuzz;
pub mod harness;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod param;
pub mod query;
pub mod row;
pub mod sql;
pub mod types;
pub mod value;

pub use bind::{bind_batch, bind_named};
pub use condition::{
    BoolCondition, Condition, EnumCondition, FloatCondition, IntCondition, OptBoolCondition,
    OptIntCondition, SelectCondition, StringCondition, TimeCondition,
};
pub use enumeration::Enumerable;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use expr::{Op, and, cond, not, or, where_clause};
pub use filter::{Filter, Where};
pub use harness::{QuerySuite, SuiteReport};
pub use logging::{LogFormat, LogSettings};
pub use model::{Field, Model, Schema, Style};
pub use pagination::{Page, Pagination, page_meta};
pub use param::{NamedParams, Params, SqlValue, Void};
pub use query::{Executor, LazyQuery, Output, Query, QueryKind, Shape};
pub use row::{FromRow, FromValue, Row};
pub use sql::{DatabaseType, rebind};
pub use types::{SortOrder, Sorting};
pub use value::{Value, Zero};

/// Prelude for common imports.
///
/// Leaf conditions (`Eq`, `In`, ...) are left out so they do not shadow the
/// standard traits of the same name; use them through [`condition`].
pub mod prelude {
    pub use crate::condition::{
        BoolCondition, Condition, EnumCondition, FloatCondition, IntCondition,
        OptBoolCondition, OptIntCondition, SelectCondition, StringCondition, TimeCondition,
    };
    pub use crate::enumeration::Enumerable;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::expr::{Op, and, not, or, where_clause};
    pub use crate::filter::{Filter, Where};
    pub use crate::model::{Field, Model, Schema};
    pub use crate::pagination::{Page, Pagination};
    pub use crate::param::{NamedParams, Params, SqlValue, Void};
    pub use crate::query::{Executor, LazyQuery, Query};
    pub use crate::row::{FromRow, FromValue, Row};
    pub use crate::types::{SortOrder, Sorting};
    pub use crate::value::{Value, Zero};
    pub use crate::{enumeration, impl_from_row, impl_output};
}
