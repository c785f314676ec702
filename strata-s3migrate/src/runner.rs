//! Applies migrations from a source through a driver.
//!
//! Every version is applied in three writes: the state is set to the new
//! version marked dirty, the body runs, and the state is set clean. A body
//! that fails leaves the state dirty at its version; [`Migrator::force`]
//! clears it once the bucket has been repaired by hand.

use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::driver::Driver;
use crate::error::{MigrateResult, MigrationError};
use crate::source::MigrationSource;
use crate::state::{MigrationState, NIL_VERSION};

/// Runs a [`MigrationSource`] against a [`Driver`].
#[derive(Debug)]
pub struct Migrator<D, S> {
    driver: D,
    source: S,
}

impl<D: Driver, S: MigrationSource> Migrator<D, S> {
    /// Pair a driver with a source.
    pub fn new(driver: D, source: S) -> Self {
        Self { driver, source }
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current state.
    pub async fn version(&self) -> MigrateResult<MigrationState> {
        self.driver.version().await
    }

    async fn clean_version(&self) -> MigrateResult<i64> {
        let state = self.driver.version().await?;
        if state.dirty {
            return Err(MigrationError::Dirty(state.version));
        }
        Ok(state.version)
    }

    /// Apply every version newer than the current one, in ascending order.
    ///
    /// Returns the versions applied; an empty list means there was nothing
    /// to do.
    #[instrument(skip(self))]
    pub async fn up(&self) -> MigrateResult<Vec<i64>> {
        self.driver.lock().await?;
        let result = self.up_locked().await;
        self.driver.unlock().await?;
        result
    }

    async fn up_locked(&self) -> MigrateResult<Vec<i64>> {
        let current = self.clean_version().await?;
        let pending: Vec<i64> = self
            .source
            .versions()
            .into_iter()
            .filter(|v| *v > current)
            .collect();

        let mut applied = Vec::with_capacity(pending.len());
        for version in pending {
            let body = self.source.read_up(version).await?.ok_or_else(|| {
                MigrationError::invalid_source(format!("no up migration for version {}", version))
            })?;
            self.apply(version, version, &body).await?;
            applied.push(version);
        }

        if applied.is_empty() {
            info!(version = current, "no change");
        }
        Ok(applied)
    }

    /// Revert every applied version, newest first, down to no version.
    ///
    /// Returns the versions reverted.
    #[instrument(skip(self))]
    pub async fn down(&self) -> MigrateResult<Vec<i64>> {
        self.driver.lock().await?;
        let result = self.down_locked().await;
        self.driver.unlock().await?;
        result
    }

    async fn down_locked(&self) -> MigrateResult<Vec<i64>> {
        let mut current = self.clean_version().await?;
        let mut reverted = Vec::new();

        while current != NIL_VERSION {
            let target = self.source.prev(current).unwrap_or(NIL_VERSION);
            let body = self.source.read_down(current).await?.ok_or_else(|| {
                MigrationError::invalid_source(format!("no down migration for version {}", current))
            })?;
            self.apply(current, target, &body).await?;
            reverted.push(current);
            current = target;
        }
        Ok(reverted)
    }

    async fn apply(&self, version: i64, target: i64, body: &[u8]) -> MigrateResult<()> {
        let started = Instant::now();
        self.driver.set_version(target, true).await?;
        if let Err(err) = self.driver.run(body).await {
            warn!(version, error = %err, "migration failed, state left dirty");
            return Err(err);
        }
        self.driver.set_version(target, false).await?;
        info!(
            version,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "migration applied"
        );
        Ok(())
    }

    /// Set the version and clear the dirty flag without running anything.
    #[instrument(skip(self))]
    pub async fn force(&self, version: i64) -> MigrateResult<()> {
        if version < NIL_VERSION {
            return Err(MigrationError::config(format!(
                "cannot force version {}",
                version
            )));
        }
        self.driver.set_version(version, false).await
    }
}
