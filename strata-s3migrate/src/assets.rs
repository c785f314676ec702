//! Sources for uploaded assets.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{MigrateResult, MigrationError};

/// Where `UPLOAD` statements read their files from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Read the asset at `path`, as written in the statement.
    async fn read(&self, path: &str) -> MigrateResult<Vec<u8>>;
}

/// Assets under a directory; statement paths are relative to it.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    /// Serve assets from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> MigrateResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(MigrationError::asset(path, "path escapes the asset root"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for DirAssets {
    async fn read(&self, path: &str) -> MigrateResult<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| MigrationError::asset(path, e))
    }
}

/// Assets held in memory, keyed by path without a leading `/`.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// An empty set of assets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset.
    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(normalize(path).to_string(), bytes.into());
        self
    }
}

#[async_trait]
impl AssetSource for MemoryAssets {
    async fn read(&self, path: &str) -> MigrateResult<Vec<u8>> {
        self.files
            .get(normalize(path))
            .cloned()
            .ok_or_else(|| MigrationError::asset(path, "file does not exist"))
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dir_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("videos")).unwrap();
        std::fs::write(dir.path().join("videos/intro.mp4"), b"frames").unwrap();

        let assets = DirAssets::new(dir.path());
        assert_eq!(assets.read("/videos/intro.mp4").await.unwrap(), b"frames");
        assert_eq!(assets.read("videos/intro.mp4").await.unwrap(), b"frames");
        assert!(assets.read("videos/missing.mp4").await.is_err());
    }

    #[tokio::test]
    async fn test_dir_assets_stay_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let assets = DirAssets::new(dir.path().join("assets"));
        let err = assets.read("../secret").await.unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[tokio::test]
    async fn test_memory_assets() {
        let assets = MemoryAssets::new().with("/a/b.srt", "1\n00:00:01 --> 00:00:02\nhi");
        assert!(assets.read("a/b.srt").await.is_ok());
        assert!(matches!(
            assets.read("/a/c.srt").await,
            Err(MigrationError::Asset { .. })
        ));
    }
}
