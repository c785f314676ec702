//! A pooled SQLite connection.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rusqlite::params_from_iter;
use strata_query::{Row, SqlValue};
use tokio::sync::OwnedSemaphorePermit;
use tokio_rusqlite::Connection;
use tracing::{debug, trace};

use crate::error::{SqliteError, SqliteResult};
use crate::types::{read_row, to_sqlite};

/// An idle connection waiting in the pool.
pub(crate) struct IdleConnection {
    pub(crate) conn: Connection,
    pub(crate) created_at: Instant,
    pub(crate) last_used: Instant,
}

pub(crate) type IdleQueue = Arc<Mutex<VecDeque<IdleConnection>>>;

/// A connection checked out of a [`crate::SqlitePool`].
///
/// Goes back to the pool's idle queue when dropped. An in-memory pool owns a
/// single connection, so every checkout sees the same database.
pub struct SqliteConnection {
    conn: Option<Connection>,
    _permit: OwnedSemaphorePermit,
    idle: Option<IdleQueue>,
    created_at: Instant,
}

impl SqliteConnection {
    pub(crate) fn new(
        conn: Connection,
        permit: OwnedSemaphorePermit,
        idle: Option<IdleQueue>,
        created_at: Instant,
    ) -> Self {
        Self {
            conn: Some(conn),
            _permit: permit,
            idle,
            created_at,
        }
    }

    fn conn(&self) -> SqliteResult<&Connection> {
        self.conn.as_ref().ok_or(SqliteError::PoolClosed)
    }

    /// Run a query and return its rows.
    pub async fn fetch_all(&self, sql: &str, args: &[SqlValue]) -> SqliteResult<Vec<Row>> {
        let sql = sql.to_string();
        let args: Vec<_> = args.iter().map(to_sqlite).collect();
        debug!(args = args.len(), "fetching rows");

        let rows = self
            .conn()?
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let columns: Vec<String> =
                    stmt.column_names().iter().map(|c| c.to_string()).collect();
                let width = columns.len();

                let mut rows = Vec::new();
                let mut cursor = stmt.query(params_from_iter(args))?;
                while let Some(row) = cursor.next()? {
                    rows.push(Row::new(columns.clone(), read_row(row, width)?));
                }
                Ok(rows)
            })
            .await?;

        trace!(rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, sql: &str, args: &[SqlValue]) -> SqliteResult<u64> {
        let sql = sql.to_string();
        let args: Vec<_> = args.iter().map(to_sqlite).collect();
        debug!(args = args.len(), "executing statement");

        let affected = self
            .conn()?
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                Ok(stmt.execute(params_from_iter(args))?)
            })
            .await?;
        Ok(affected as u64)
    }

    /// Run several `;`-separated statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> SqliteResult<()> {
        let sql = sql.to_string();
        debug!("executing batch");

        self.conn()?
            .call(move |conn| Ok(conn.execute_batch(&sql)?))
            .await
            .map_err(SqliteError::from)
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let (Some(idle), Some(conn)) = (self.idle.take(), self.conn.take()) {
            trace!("returning connection to pool");
            idle.lock().push_back(IdleConnection {
                conn,
                created_at: self.created_at,
                last_used: Instant::now(),
            });
        }
    }
}
