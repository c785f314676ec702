//! Connection pool for SQLite.
//!
//! File databases keep up to `max_connections` connections, reusing idle ones
//! until they outlive `idle_timeout` or `max_lifetime`. An in-memory database
//! only exists inside its connection, so the pool keeps exactly one
//! connection for it and never recycles it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_rusqlite::Connection;
use tracing::{debug, info, trace};

use crate::config::{DatabasePath, SqliteConfig};
use crate::connection::{IdleConnection, IdleQueue, SqliteConnection};
use crate::error::{SqliteError, SqliteResult};

/// Pool sizing and recycling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connections checked out at once.
    pub max_connections: usize,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
    /// Idle time after which a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Age after which a connection is closed.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(300)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl PoolConfig {
    fn expired(&self, idle: &IdleConnection) -> bool {
        self.max_lifetime.is_some_and(|max| idle.created_at.elapsed() > max)
            || self.idle_timeout.is_some_and(|max| idle.last_used.elapsed() > max)
    }
}

/// Counters for pool activity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections opened.
    pub opens: u64,
    /// Idle connections handed out again.
    pub reuses: u64,
    /// Idle connections closed for age.
    pub expirations: u64,
}

/// A pool of SQLite connections.
#[derive(Clone)]
pub struct SqlitePool {
    config: Arc<SqliteConfig>,
    pool_config: Arc<PoolConfig>,
    semaphore: Arc<Semaphore>,
    idle: IdleQueue,
    stats: Arc<Mutex<PoolStats>>,
}

impl SqlitePool {
    /// Open a pool with default sizing.
    pub async fn new(config: SqliteConfig) -> SqliteResult<Self> {
        Self::with_pool_config(config, PoolConfig::default()).await
    }

    /// Open a pool; one connection is opened up front to validate `config`.
    pub async fn with_pool_config(
        config: SqliteConfig,
        mut pool_config: PoolConfig,
    ) -> SqliteResult<Self> {
        if pool_config.max_connections == 0 {
            return Err(SqliteError::config("max_connections must be at least 1"));
        }
        if config.path.is_memory() {
            pool_config.max_connections = 1;
            pool_config.idle_timeout = None;
            pool_config.max_lifetime = None;
        }

        let first = open_connection(&config).await?;
        info!(
            path = %config.path.display(),
            max_connections = pool_config.max_connections,
            "SQLite pool opened"
        );

        let now = Instant::now();
        let idle = VecDeque::from([IdleConnection {
            conn: first,
            created_at: now,
            last_used: now,
        }]);

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(pool_config.max_connections)),
            config: Arc::new(config),
            pool_config: Arc::new(pool_config),
            idle: Arc::new(Mutex::new(idle)),
            stats: Arc::new(Mutex::new(PoolStats {
                opens: 1,
                ..Default::default()
            })),
        })
    }

    /// Open a pool from a URL; see [`SqliteConfig::from_url`].
    pub async fn connect(url: &str) -> SqliteResult<Self> {
        Self::new(SqliteConfig::from_url(url)?).await
    }

    /// Check out a connection, waiting up to `acquire_timeout`.
    pub async fn get(&self) -> SqliteResult<SqliteConnection> {
        trace!("acquiring connection");
        let permit = tokio::time::timeout(
            self.pool_config.acquire_timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        .map_err(|_| SqliteError::PoolTimeout(self.pool_config.max_connections))?
        .map_err(|_| SqliteError::PoolClosed)?;

        if let Some(idle) = self.take_idle() {
            self.stats.lock().reuses += 1;
            return Ok(SqliteConnection::new(
                idle.conn,
                permit,
                Some(Arc::clone(&self.idle)),
                idle.created_at,
            ));
        }

        debug!("no idle connection, opening a new one");
        let conn = open_connection(&self.config).await?;
        self.stats.lock().opens += 1;
        Ok(SqliteConnection::new(
            conn,
            permit,
            Some(Arc::clone(&self.idle)),
            Instant::now(),
        ))
    }

    fn take_idle(&self) -> Option<IdleConnection> {
        let mut idle = self.idle.lock();
        while let Some(candidate) = idle.pop_front() {
            if self.pool_config.expired(&candidate) {
                self.stats.lock().expirations += 1;
                continue;
            }
            return Some(candidate);
        }
        None
    }

    /// The connection settings.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// The pool settings, as adjusted for the database kind.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    /// Activity counters.
    pub fn stats(&self) -> PoolStats {
        *self.stats.lock()
    }

    /// Connections waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Connections that can still be checked out.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

async fn open_connection(config: &SqliteConfig) -> SqliteResult<Connection> {
    let conn = match &config.path {
        DatabasePath::Memory => Connection::open_in_memory().await?,
        DatabasePath::File(path) => Connection::open(path.clone()).await?,
    };

    let init_sql = config.init_sql();
    conn.call(move |conn| Ok(conn.execute_batch(&init_sql)?)).await?;
    Ok(conn)
}
