//! SQLite executor for strata queries.
//!
//! Queries run on a small pool of [`tokio_rusqlite`] connections. Driver
//! errors are classified into [`strata_query::ErrorCode`]s so constraint
//! violations and missing rows can be told apart from real failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_query::{Query, Void};
//! use strata_sqlite::{SqliteConfig, SqliteEngine};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SqliteEngine::open(SqliteConfig::from_url("sqlite://./app.db")?).await?;
//! engine
//!     .execute_script("CREATE TABLE IF NOT EXISTS tag (name TEXT PRIMARY KEY)")
//!     .await?;
//!
//! let count: Query<Void, i64> = Query::new("count_tags", "SELECT COUNT(*) FROM tag");
//! let n = count.run_one(&engine, Void).await?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod pool;
pub mod types;

pub use config::{DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use connection::SqliteConnection;
pub use engine::SqliteEngine;
pub use error::{SqliteError, SqliteResult, classify};
pub use pool::{PoolConfig, PoolStats, SqlitePool};
