//! The S3 migration driver.
//!
//! The driver keeps a [`MigrationState`] object at [`STATE_KEY`] in the
//! migrated bucket and applies migration bodies as uploads and deletes.
//! It holds no state of its own: every call reads or writes the bucket.
//!
//! There is no locking. Two runners migrating the same bucket at once can
//! interleave; callers that need exclusion must provide it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::assets::AssetSource;
use crate::content_type::{content_type_for, extension_of};
use crate::error::MigrateResult;
use crate::state::{MigrationState, STATE_KEY};
use crate::statement::{Statement, parse_statements};
use crate::store::{Metadata, ObjectStore};

const STATE_CONTENT_TYPE: &str = "application/json";

/// Operations a migration runner needs from a target.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Apply one migration body.
    async fn run(&self, body: &[u8]) -> MigrateResult<()>;

    /// Record the applied version.
    async fn set_version(&self, version: i64, dirty: bool) -> MigrateResult<()>;

    /// Read the applied version.
    async fn version(&self) -> MigrateResult<MigrationState>;

    /// Take the migration lock.
    async fn lock(&self) -> MigrateResult<()>;

    /// Release the migration lock.
    async fn unlock(&self) -> MigrateResult<()>;

    /// Remove everything the migrations created.
    async fn drop_all(&self) -> MigrateResult<()>;

    /// Release resources.
    async fn close(&self) -> MigrateResult<()>;
}

/// Migrates the objects of one bucket.
#[derive(Clone)]
pub struct S3Driver {
    store: Arc<dyn ObjectStore>,
    assets: Arc<dyn AssetSource>,
}

impl std::fmt::Debug for S3Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Driver")
            .field("bucket", &self.store.bucket())
            .finish()
    }
}

impl S3Driver {
    /// Open the driver, creating the bucket and the state object if needed.
    #[instrument(skip_all, fields(bucket = %store.bucket()))]
    pub async fn open(
        store: impl ObjectStore + 'static,
        assets: impl AssetSource + 'static,
    ) -> MigrateResult<Self> {
        Self::open_shared(Arc::new(store), Arc::new(assets)).await
    }

    /// Like [`S3Driver::open`], for a store and assets already shared.
    pub async fn open_shared(
        store: Arc<dyn ObjectStore>,
        assets: Arc<dyn AssetSource>,
    ) -> MigrateResult<Self> {
        if !store.bucket_exists().await? {
            info!(bucket = %store.bucket(), "creating bucket");
            store.create_bucket().await?;
        }

        let driver = Self { store, assets };
        driver.ensure_state().await?;
        Ok(driver)
    }

    /// The bucket being migrated.
    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    async fn ensure_state(&self) -> MigrateResult<()> {
        if self.store.head_object(STATE_KEY).await? {
            return Ok(());
        }
        debug!(key = STATE_KEY, "initializing migration state");
        self.write_state(MigrationState::default()).await
    }

    async fn write_state(&self, state: MigrationState) -> MigrateResult<()> {
        self.store
            .put_object(
                STATE_KEY,
                state.to_bytes()?,
                Some(STATE_CONTENT_TYPE),
                Metadata::new(),
            )
            .await
    }

    async fn apply(&self, statement: &Statement) -> MigrateResult<()> {
        match statement {
            Statement::Upload { path, filename } => {
                info!(%filename, %path, "uploading file");
                let body = self.assets.read(path).await?;
                let content_type = content_type_for(path);
                let metadata = Metadata::from([
                    ("Content-Type".to_string(), content_type.to_string()),
                    ("Extension".to_string(), extension_of(path)),
                ]);
                self.store
                    .put_object(filename, body, Some(content_type), metadata)
                    .await
            }
            Statement::Delete { filename } => {
                info!(%filename, "deleting file");
                self.store.delete_object(filename).await
            }
        }
    }
}

#[async_trait]
impl Driver for S3Driver {
    /// Statements run in order; the first failure stops the run.
    async fn run(&self, body: &[u8]) -> MigrateResult<()> {
        let statements = parse_statements(body)?;
        debug!(count = statements.len(), "running migration");
        for statement in &statements {
            self.apply(statement).await?;
        }
        Ok(())
    }

    async fn set_version(&self, version: i64, dirty: bool) -> MigrateResult<()> {
        debug!(version, dirty, "setting migration version");
        self.write_state(MigrationState::new(version, dirty)).await
    }

    async fn version(&self) -> MigrateResult<MigrationState> {
        let bytes = self.store.get_object(STATE_KEY).await?;
        MigrationState::from_bytes(&bytes)
    }

    async fn lock(&self) -> MigrateResult<()> {
        Ok(())
    }

    async fn unlock(&self) -> MigrateResult<()> {
        Ok(())
    }

    /// Does nothing; wiping a bucket is left to its owner.
    async fn drop_all(&self) -> MigrateResult<()> {
        Ok(())
    }

    async fn close(&self) -> MigrateResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::error::MigrationError;
    use crate::store::MemoryObjectStore;
    use pretty_assertions::assert_eq;

    async fn open(store: &MemoryObjectStore) -> S3Driver {
        let assets = MemoryAssets::new()
            .with("/videos/intro.mp4", b"frames".to_vec())
            .with("/subs/intro.srt", b"1\nhello".to_vec());
        S3Driver::open(store.clone(), assets).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_initializes_bucket_and_state() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;

        assert!(store.bucket_exists().await.unwrap());
        assert_eq!(
            store.object(STATE_KEY).unwrap().body,
            br#"{"version":-1,"dirty":false}"#
        );
        assert_eq!(driver.version().await.unwrap(), MigrationState::new(-1, false));
    }

    #[tokio::test]
    async fn test_reopen_keeps_state() {
        let store = MemoryObjectStore::new("media");
        open(&store).await.set_version(3, false).await.unwrap();

        let driver = open(&store).await;
        assert_eq!(driver.version().await.unwrap(), MigrationState::new(3, false));
    }

    #[tokio::test]
    async fn test_run_uploads_with_metadata() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;

        driver
            .run(br#"[{"action":"UPLOAD","path":"/videos/intro.mp4","filename":"intro.mp4"}]"#)
            .await
            .unwrap();

        let object = store.object("intro.mp4").unwrap();
        assert_eq!(object.body, b"frames");
        assert_eq!(object.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(object.metadata["Content-Type"], "video/mp4");
        assert_eq!(object.metadata["Extension"], ".mp4");
    }

    #[tokio::test]
    async fn test_run_is_ordered() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;

        driver
            .run(
                br#"[
                    {"action":"UPLOAD","path":"/subs/intro.srt","filename":"a.srt"},
                    {"action":"DELETE","filename":"a.srt"},
                    {"action":"UPLOAD","path":"/subs/intro.srt","filename":"b.srt"}
                ]"#,
            )
            .await
            .unwrap();
        assert_eq!(store.keys(), vec!["b.srt".to_string(), STATE_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_run_stops_at_first_failure() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;

        let err = driver
            .run(
                br#"[
                    {"action":"UPLOAD","path":"/videos/intro.mp4","filename":"one.mp4"},
                    {"action":"UPLOAD","path":"/videos/missing.mp4","filename":"two.mp4"},
                    {"action":"UPLOAD","path":"/videos/intro.mp4","filename":"three.mp4"}
                ]"#,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Asset { .. }));
        assert!(store.object("one.mp4").is_some());
        assert!(store.object("three.mp4").is_none());
    }

    #[tokio::test]
    async fn test_bad_body_touches_nothing() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;

        let err = driver
            .run(br#"[{"action":"DELETE","filename":"x"},{"action":"MOVE"}]"#)
            .await
            .unwrap_err();
        assert!(err.is_statement_error());
        assert_eq!(store.keys(), vec![STATE_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_state_is_an_error() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;
        store
            .put_object(STATE_KEY, b"{".to_vec(), None, Metadata::new())
            .await
            .unwrap();
        assert!(matches!(driver.version().await, Err(MigrationError::State(_))));
    }

    #[tokio::test]
    async fn test_noops() {
        let store = MemoryObjectStore::new("media");
        let driver = open(&store).await;
        driver.lock().await.unwrap();
        driver.unlock().await.unwrap();
        driver.drop_all().await.unwrap();
        driver.close().await.unwrap();
        assert_eq!(store.keys(), vec![STATE_KEY.to_string()]);
    }
}
