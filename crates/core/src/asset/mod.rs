//! Files the provisioning pipeline works with.
//!
//! An [`Asset`] is a named file inside the storage directory. A
//! [`RemoteAsset`] composes an asset with the release coordinates it can be
//! downloaded from; the transport itself sits behind [`ReleaseSource`].

pub mod remote;

pub use remote::{HttpReleaseSource, ReleaseSource, RemoteAsset};

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// A named file at `<storage_dir>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    name: String,
    storage_dir: PathBuf,
}

impl Asset {
    pub fn new(name: impl Into<String>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage_dir: storage_dir.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn local_path(&self) -> PathBuf {
        self.storage_dir.join(&self.name)
    }

    pub fn exists(&self) -> bool {
        self.local_path().exists()
    }

    /// Full byte content of the file.
    pub async fn content(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.local_path()).await?)
    }

    /// Delete the file. Fails if it is absent or cannot be removed.
    pub fn remove(&self) -> Result<()> {
        info!("removing {}...", self.name);
        std::fs::remove_file(self.local_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VigilError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_asset_lifecycle() {
        let temp = TempDir::new().unwrap();
        let asset = Asset::new("grype", temp.path());
        assert_eq!(asset.local_path(), temp.path().join("grype"));
        assert!(!asset.exists());

        std::fs::write(asset.local_path(), b"#!/bin/sh\n").unwrap();
        assert!(asset.exists());
        assert_eq!(asset.content().await.unwrap(), b"#!/bin/sh\n");

        asset.remove().unwrap();
        assert!(!asset.exists());
    }

    #[tokio::test]
    async fn test_missing_asset_errors() {
        let temp = TempDir::new().unwrap();
        let asset = Asset::new("absent.txt", temp.path());

        assert!(matches!(asset.content().await, Err(VigilError::Io(_))));
        match asset.remove() {
            Err(VigilError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
