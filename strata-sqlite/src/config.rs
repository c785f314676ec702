//! SQLite configuration.

use std::path::{Path, PathBuf};

use crate::error::{SqliteError, SqliteResult};

/// Where the database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database, private to each connection.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Human readable form for logs.
    pub fn display(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// `PRAGMA synchronous` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    /// No syncs.
    Off,
    /// Sync at critical moments.
    #[default]
    Normal,
    /// Sync on every commit.
    Full,
}

impl SynchronousMode {
    /// The pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
        }
    }

    fn parse(value: &str) -> SqliteResult<Self> {
        match value.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "normal" => Ok(Self::Normal),
            "full" => Ok(Self::Full),
            other => Err(SqliteError::config(format!("unknown synchronous mode `{}`", other))),
        }
    }
}

/// `PRAGMA journal_mode` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JournalMode {
    /// Rollback journal deleted after each transaction.
    Delete,
    /// Journal kept in memory.
    Memory,
    /// Write-ahead log.
    #[default]
    Wal,
}

impl JournalMode {
    /// The pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
        }
    }

    fn parse(value: &str) -> SqliteResult<Self> {
        match value.to_lowercase().as_str() {
            "delete" => Ok(Self::Delete),
            "memory" => Ok(Self::Memory),
            "wal" => Ok(Self::Wal),
            other => Err(SqliteError::config(format!("unknown journal mode `{}`", other))),
        }
    }
}

/// Connection settings applied to every new connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database location.
    pub path: DatabasePath,
    /// Enforce foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Synchronous mode.
    pub synchronous: SynchronousMode,
    /// Journal mode.
    pub journal_mode: JournalMode,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            synchronous: SynchronousMode::Normal,
            journal_mode: JournalMode::Wal,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> SqliteResult<bool> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(SqliteError::config(format!("`{}` expects a boolean, got `{}`", key, value))),
    }
}

impl SqliteConfig {
    /// An in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// A file-based database.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Parse a SQLite URL.
    ///
    /// Accepts `sqlite::memory:`, `:memory:`, `sqlite://path`, `sqlite:path`,
    /// `file:path` and bare paths, optionally followed by
    /// `?foreign_keys=..&busy_timeout=..&synchronous=..&journal_mode=..`.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url = url.as_ref();
        let (location, query) = match url.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url, None),
        };

        let path = ["sqlite://", "sqlite:", "file:"]
            .iter()
            .find_map(|scheme| location.strip_prefix(scheme))
            .unwrap_or(location);

        let mut config = match path {
            "" => return Err(SqliteError::config("database path is required")),
            ":memory:" => Self::memory(),
            path => Self::file(path),
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| SqliteError::config(format!("malformed option `{}`", pair)))?;
            config.apply_option(key, value)?;
        }

        Ok(config)
    }

    fn apply_option(&mut self, key: &str, value: &str) -> SqliteResult<()> {
        match key {
            "mode" if value == "memory" => self.path = DatabasePath::Memory,
            "foreign_keys" => self.foreign_keys = parse_flag(key, value)?,
            "busy_timeout" => {
                self.busy_timeout_ms = value.parse().map_err(|_| {
                    SqliteError::config(format!("invalid busy_timeout `{}`", value))
                })?
            }
            "synchronous" => self.synchronous = SynchronousMode::parse(value)?,
            "journal_mode" => self.journal_mode = JournalMode::parse(value)?,
            _ => return Err(SqliteError::config(format!("unknown option `{}`", key))),
        }
        Ok(())
    }

    /// Pragmas run on every new connection.
    pub fn init_sql(&self) -> String {
        let mut sql = format!(
            "PRAGMA foreign_keys = {};\nPRAGMA busy_timeout = {};\nPRAGMA synchronous = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" },
            self.busy_timeout_ms,
            self.synchronous.as_pragma(),
        );
        if !self.path.is_memory() {
            sql.push_str(&format!("PRAGMA journal_mode = {};\n", self.journal_mode.as_pragma()));
        }
        sql
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }
}
