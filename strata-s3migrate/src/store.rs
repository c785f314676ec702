//! Object store seam.
//!
//! The driver only needs a handful of bucket operations. [`S3ObjectStore`]
//! provides them over the AWS SDK; [`MemoryObjectStore`] keeps objects in a
//! map for tests and dry runs.
//!
//! [`S3ObjectStore`]: crate::s3::S3ObjectStore

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{MigrateResult, MigrationError};

/// Metadata attached to an uploaded object.
pub type Metadata = HashMap<String, String>;

/// A single bucket in an object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// The bucket name.
    fn bucket(&self) -> &str;

    /// Check whether the bucket exists.
    async fn bucket_exists(&self) -> MigrateResult<bool>;

    /// Create the bucket.
    async fn create_bucket(&self) -> MigrateResult<()>;

    /// Check whether `key` exists.
    async fn head_object(&self, key: &str) -> MigrateResult<bool>;

    /// Write `key`, replacing any existing object.
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: Metadata,
    ) -> MigrateResult<()>;

    /// Read `key`; a missing object is [`MigrationError::NotFound`].
    async fn get_object(&self, key: &str) -> MigrateResult<Vec<u8>>;

    /// Remove `key`; removing a missing object succeeds.
    async fn delete_object(&self, key: &str) -> MigrateResult<()>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn bucket(&self) -> &str {
        (**self).bucket()
    }

    async fn bucket_exists(&self) -> MigrateResult<bool> {
        (**self).bucket_exists().await
    }

    async fn create_bucket(&self) -> MigrateResult<()> {
        (**self).create_bucket().await
    }

    async fn head_object(&self, key: &str) -> MigrateResult<bool> {
        (**self).head_object(key).await
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: Metadata,
    ) -> MigrateResult<()> {
        (**self).put_object(key, body, content_type, metadata).await
    }

    async fn get_object(&self, key: &str) -> MigrateResult<Vec<u8>> {
        (**self).get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> MigrateResult<()> {
        (**self).delete_object(key).await
    }
}

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes.
    pub body: Vec<u8>,
    /// Content type given on upload.
    pub content_type: Option<String>,
    /// User metadata given on upload.
    pub metadata: Metadata,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    exists: bool,
    objects: BTreeMap<String, StoredObject>,
}

/// An in-memory bucket.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    inner: Arc<Mutex<MemoryBucket>>,
}

impl MemoryObjectStore {
    /// A store whose bucket does not exist yet.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            inner: Arc::new(Mutex::new(MemoryBucket::default())),
        }
    }

    /// A copy of the object at `key`.
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.inner.lock().objects.get(key).cloned()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().objects.keys().cloned().collect()
    }

    fn require_bucket(&self, op: &'static str) -> MigrateResult<()> {
        if self.inner.lock().exists {
            Ok(())
        } else {
            Err(MigrationError::store(op, &self.bucket, "bucket does not exist"))
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> MigrateResult<bool> {
        Ok(self.inner.lock().exists)
    }

    async fn create_bucket(&self) -> MigrateResult<()> {
        self.inner.lock().exists = true;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> MigrateResult<bool> {
        self.require_bucket("head")?;
        Ok(self.inner.lock().objects.contains_key(key))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: Metadata,
    ) -> MigrateResult<()> {
        self.require_bucket("put")?;
        self.inner.lock().objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.map(str::to_string),
                metadata,
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> MigrateResult<Vec<u8>> {
        self.require_bucket("get")?;
        self.inner
            .lock()
            .objects
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| MigrationError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> MigrateResult<()> {
        self.require_bucket("delete")?;
        self.inner.lock().objects.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_must_exist() {
        let store = MemoryObjectStore::new("media");
        assert!(!store.bucket_exists().await.unwrap());
        assert!(store.get_object("k").await.is_err());

        store.create_bucket().await.unwrap();
        assert!(store.bucket_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_object_lifecycle() {
        let store = MemoryObjectStore::new("media");
        store.create_bucket().await.unwrap();

        let metadata = Metadata::from([("Extension".to_string(), ".txt".to_string())]);
        store
            .put_object("a.txt", b"hi".to_vec(), Some("text/plain"), metadata)
            .await
            .unwrap();
        assert!(store.head_object("a.txt").await.unwrap());
        assert_eq!(store.get_object("a.txt").await.unwrap(), b"hi");
        assert_eq!(
            store.object("a.txt").unwrap().content_type.as_deref(),
            Some("text/plain")
        );

        store.delete_object("a.txt").await.unwrap();
        store.delete_object("a.txt").await.unwrap();
        assert!(store.get_object("a.txt").await.unwrap_err().is_not_found());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_objects() {
        let store = MemoryObjectStore::new("media");
        let shared: Arc<dyn ObjectStore> = Arc::new(store.clone());
        shared.create_bucket().await.unwrap();
        shared
            .put_object("k", vec![1], None, Metadata::new())
            .await
            .unwrap();
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }
}
