//! The migration state object.

use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};

/// Key of the state object inside the migrated bucket.
pub const STATE_KEY: &str = "migrationState.json";

/// Name the driver is registered under; also the DSN scheme.
pub const DRIVER_NAME: &str = "s3migrator";

/// Version of a bucket with no migrations applied.
pub const NIL_VERSION: i64 = -1;

/// Applied version and whether the last run stopped mid-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationState {
    /// Last applied version, or [`NIL_VERSION`].
    pub version: i64,
    /// Set while a migration runs; left set if it fails.
    #[serde(default)]
    pub dirty: bool,
}

impl Default for MigrationState {
    fn default() -> Self {
        Self {
            version: NIL_VERSION,
            dirty: false,
        }
    }
}

impl MigrationState {
    /// A state at `version`.
    pub fn new(version: i64, dirty: bool) -> Self {
        Self { version, dirty }
    }

    /// True if no migration has been applied.
    pub fn is_nil(&self) -> bool {
        self.version == NIL_VERSION
    }

    /// Encode as stored.
    pub fn to_bytes(&self) -> MigrateResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a stored state object.
    pub fn from_bytes(bytes: &[u8]) -> MigrateResult<Self> {
        serde_json::from_slice(bytes).map_err(MigrationError::State)
    }
}
