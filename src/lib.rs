//! # Strata
//!
//! Typed SQL templates for hand-written queries, with composable request
//! filters, pagination, and an S3-backed migration driver.
//!
//! Strata provides:
//! - [`query`]: `Value<T>`, filter conditions, `Where<F>` trees, model column
//!   lists, `Query`/`LazyQuery` descriptors, pagination and a query test harness
//! - [`sqlite`]: a pooled async SQLite executor (feature `sqlite`)
//! - [`s3migrate`]: versioned bucket migrations with state kept in the bucket
//!   (feature `s3migrate`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strata::prelude::*;
//! use strata::sqlite::{SqliteConfig, SqliteEngine};
//!
//! struct Tag {
//!     id: i64,
//!     name: String,
//! }
//!
//! strata::impl_from_row!(Tag { id: i64, name: String });
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = SqliteEngine::open(SqliteConfig::memory()).await?;
//! db.execute_script("CREATE TABLE tag (id INTEGER PRIMARY KEY, name TEXT)").await?;
//!
//! let list: Query<Void, Vec<Tag>> = Query::new("listTags", "SELECT id, name FROM tag");
//! let page = list
//!     .paged(&db, vec![], Pagination::new(20, 0), &Sorting::new().asc("name"))
//!     .await?;
//! println!("{} of {} tags", page.items.len(), page.total);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Query templating, filters and pagination.
pub mod query {
    pub use strata_query::*;
}

/// Pooled SQLite executor.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    pub use strata_sqlite::*;
}

/// S3-backed migration driver.
#[cfg(feature = "s3migrate")]
#[cfg_attr(docsrs, doc(cfg(feature = "s3migrate")))]
pub mod s3migrate {
    pub use strata_s3migrate::*;
}

pub use strata_query::{enumeration, impl_from_row, impl_output};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use strata_query::prelude::*;
    pub use strata_query::{Pagination, Sorting, Void};
}

// Re-export key types at the crate root
pub use strata_query::{QueryError, QueryResult};
