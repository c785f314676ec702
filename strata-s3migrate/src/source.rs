//! Migration sources.
//!
//! A source lists migration versions and returns the body of each version's
//! up or down migration. Files in a [`DirSource`] are named
//! `<version>_<name>.up.json` and `<version>_<name>.down.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::env::{EnvSource, StdEnv, expand};
use crate::error::{MigrateResult, MigrationError};

/// Direction of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply.
    Up,
    /// Revert.
    Down,
}

impl Direction {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Up => ".up.json",
            Self::Down => ".down.json",
        }
    }
}

/// Versioned migration bodies.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// All versions, ascending.
    fn versions(&self) -> Vec<i64>;

    /// The up migration of `version`, if there is one.
    async fn read_up(&self, version: i64) -> MigrateResult<Option<Vec<u8>>>;

    /// The down migration of `version`, if there is one.
    async fn read_down(&self, version: i64) -> MigrateResult<Option<Vec<u8>>>;

    /// The first version after `version`.
    fn next(&self, version: i64) -> Option<i64> {
        self.versions().into_iter().find(|v| *v > version)
    }

    /// The last version before `version`.
    fn prev(&self, version: i64) -> Option<i64> {
        self.versions().into_iter().rev().find(|v| *v < version)
    }
}

#[async_trait]
impl<S: MigrationSource + ?Sized> MigrationSource for Arc<S> {
    fn versions(&self) -> Vec<i64> {
        (**self).versions()
    }

    async fn read_up(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        (**self).read_up(version).await
    }

    async fn read_down(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        (**self).read_down(version).await
    }
}

#[derive(Debug, Clone, Default)]
struct DirEntry {
    name: String,
    up: Option<PathBuf>,
    down: Option<PathBuf>,
}

/// Migrations stored as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
    entries: BTreeMap<i64, DirEntry>,
}

impl DirSource {
    /// Index the migrations in `dir`. Files not named like migrations are ignored.
    pub async fn open(dir: impl Into<PathBuf>) -> MigrateResult<Self> {
        let dir = dir.into();
        let mut entries: BTreeMap<i64, DirEntry> = BTreeMap::new();

        let mut listing = tokio::fs::read_dir(&dir).await?;
        while let Some(file) = listing.next_entry().await? {
            let path = file.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((version, name, direction)) = parse_file_name(file_name) else {
                debug!(file = %file_name, "skipping non-migration file");
                continue;
            };

            let entry = entries.entry(version).or_default();
            if !entry.name.is_empty() && entry.name != name {
                return Err(MigrationError::invalid_source(format!(
                    "version {} is used by both '{}' and '{}'",
                    version, entry.name, name
                )));
            }
            entry.name = name.to_string();

            let slot = match direction {
                Direction::Up => &mut entry.up,
                Direction::Down => &mut entry.down,
            };
            if slot.is_some() {
                return Err(MigrationError::invalid_source(format!(
                    "duplicate {:?} migration for version {}",
                    direction, version
                )));
            }
            *slot = Some(path.clone());
        }

        debug!(dir = %dir.display(), count = entries.len(), "migrations indexed");
        Ok(Self { dir, entries })
    }

    /// The migrations directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The name part of `version`'s file names.
    pub fn name(&self, version: i64) -> Option<&str> {
        self.entries.get(&version).map(|e| e.name.as_str())
    }

    async fn read(&self, version: i64, direction: Direction) -> MigrateResult<Option<Vec<u8>>> {
        let path = self.entries.get(&version).and_then(|e| match direction {
            Direction::Up => e.up.as_ref(),
            Direction::Down => e.down.as_ref(),
        });
        match path {
            Some(path) => Ok(Some(tokio::fs::read(path).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MigrationSource for DirSource {
    fn versions(&self) -> Vec<i64> {
        self.entries.keys().copied().collect()
    }

    async fn read_up(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        self.read(version, Direction::Up).await
    }

    async fn read_down(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        self.read(version, Direction::Down).await
    }
}

/// Split `12_add_intro.up.json` into `(12, "add_intro", Up)`.
fn parse_file_name(file_name: &str) -> Option<(i64, &str, Direction)> {
    let (stem, direction) = [Direction::Up, Direction::Down]
        .into_iter()
        .find_map(|d| file_name.strip_suffix(d.suffix()).map(|stem| (stem, d)))?;

    let (version, name) = stem.split_once('_')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) || name.is_empty() {
        return None;
    }
    Some((version.parse().ok()?, name, direction))
}

/// Migrations held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    up: BTreeMap<i64, Vec<u8>>,
    down: BTreeMap<i64, Vec<u8>>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an up migration.
    pub fn up(mut self, version: i64, body: impl Into<Vec<u8>>) -> Self {
        self.up.insert(version, body.into());
        self
    }

    /// Add a down migration.
    pub fn down(mut self, version: i64, body: impl Into<Vec<u8>>) -> Self {
        self.down.insert(version, body.into());
        self
    }
}

#[async_trait]
impl MigrationSource for MemorySource {
    fn versions(&self) -> Vec<i64> {
        let mut versions: Vec<i64> = self.up.keys().chain(self.down.keys()).copied().collect();
        versions.sort_unstable();
        versions.dedup();
        versions
    }

    async fn read_up(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        Ok(self.up.get(&version).cloned())
    }

    async fn read_down(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        Ok(self.down.get(&version).cloned())
    }
}

/// Wraps a source and expands environment variables in every body it reads.
///
/// See [`crate::env`] for the syntax.
pub struct EnvExpandingSource<S> {
    inner: S,
    env: Box<dyn EnvSource>,
}

impl<S: MigrationSource> EnvExpandingSource<S> {
    /// Expand from the process environment.
    pub fn new(inner: S) -> Self {
        Self::with_env(inner, StdEnv)
    }

    /// Expand from `env`.
    pub fn with_env(inner: S, env: impl EnvSource + 'static) -> Self {
        Self {
            inner,
            env: Box::new(env),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn expand(&self, body: Option<Vec<u8>>) -> MigrateResult<Option<Vec<u8>>> {
        body.map(|body| {
            let text = String::from_utf8(body)
                .map_err(|e| MigrationError::invalid_source(format!("body is not UTF-8: {}", e)))?;
            Ok(expand(&text, self.env.as_ref()).into_bytes())
        })
        .transpose()
    }
}

#[async_trait]
impl<S: MigrationSource> MigrationSource for EnvExpandingSource<S> {
    fn versions(&self) -> Vec<i64> {
        self.inner.versions()
    }

    async fn read_up(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        let body = self.inner.read_up(version).await?;
        self.expand(body)
    }

    async fn read_down(&self, version: i64) -> MigrateResult<Option<Vec<u8>>> {
        let body = self.inner.read_down(version).await?;
        self.expand(body)
    }
}
