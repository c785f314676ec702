//! [`Executor`] over a SQLite pool.

use async_trait::async_trait;
use strata_query::{DatabaseType, Executor, QueryResult, Row, SqlValue};
use tracing::{debug, instrument};

use crate::config::SqliteConfig;
use crate::error::SqliteResult;
use crate::pool::SqlitePool;

/// Runs queries on pooled SQLite connections, one checkout per call.
#[derive(Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl SqliteEngine {
    /// Wrap a pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `config` and wrap it.
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::new(config).await?))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a `;`-separated script, such as a schema.
    #[instrument(skip_all, fields(sql_len = sql.len()))]
    pub async fn execute_script(&self, sql: &str) -> QueryResult<()> {
        let conn = self.pool.get().await?;
        conn.execute_batch(sql).await?;
        Ok(())
    }
}

#[async_trait]
impl Executor for SqliteEngine {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    #[instrument(skip_all, fields(args = args.len()))]
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> QueryResult<u64> {
        let conn = self.pool.get().await?;
        let affected = conn.execute(sql, args).await?;
        debug!(affected, "statement done");
        Ok(affected)
    }

    #[instrument(skip_all, fields(args = args.len()))]
    async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> QueryResult<Vec<Row>> {
        let conn = self.pool.get().await?;
        Ok(conn.fetch_all(sql, args).await?)
    }
}
