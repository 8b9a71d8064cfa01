//! Integrity checks for the scanner executable.
//!
//! The trusted digest of the executable comes from one of two places:
//! the [`VersionDigest`] record persisted after the last successful
//! provisioning, or, when no record exists for the required version, a fresh
//! provisioning cycle whose archive is checked against the release's
//! checksums manifest before it is unpacked.

pub mod digest;
pub mod extract;
pub mod manifest;

pub use digest::{digest_asset, digest_bytes};

use crate::asset::{Asset, ReleaseSource, RemoteAsset};
use crate::config::GrypeConfig;
use crate::error::{Result, VigilError};
use crate::platform::Platform;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_api::{Digest, StateStore, StateStoreExt, VersionDigest};

pub struct Verifier {
    required_version: String,
    platform: Platform,
    checksums: RemoteAsset,
    archive: RemoteAsset,
    executable: Asset,
    store: Arc<dyn StateStore>,
    source: Arc<dyn ReleaseSource>,
}

impl Verifier {
    pub fn new(
        config: &GrypeConfig,
        platform: Platform,
        archive: RemoteAsset,
        executable: Asset,
        store: Arc<dyn StateStore>,
        source: Arc<dyn ReleaseSource>,
    ) -> Self {
        let checksums = RemoteAsset::new(
            manifest::checksums_name(&config.required_version),
            executable.storage_dir(),
            config.required_version.clone(),
            config.repository_url.clone(),
        );

        Self {
            required_version: config.required_version.clone(),
            platform,
            checksums,
            archive,
            executable,
            store,
            source,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Check `executable` against the trusted digest for the required version.
    ///
    /// Without a stored record this provisions first, so a first run both
    /// bootstraps and verifies.
    pub async fn verify_executable(&self, executable: &Asset) -> Result<()> {
        let required = self.required_executable_digest().await?;
        self.verify_file(executable, &required).await
    }

    /// Download, verify, unpack and record the executable. Returns the digest
    /// now on record.
    ///
    /// On any failure the downloaded manifest and archive are removed, so no
    /// untrusted or partial release file outlives the attempt.
    pub async fn download_and_verify_executable(&self, executable_name: &str) -> Result<Digest> {
        let result = self.provision(executable_name).await;
        if result.is_err() {
            self.discard_release_files();
        }
        result
    }

    async fn provision(&self, executable_name: &str) -> Result<Digest> {
        self.checksums.download(self.source.as_ref()).await?;
        self.archive.download(self.source.as_ref()).await?;

        self.verify_archive().await?;
        self.checksums.asset().remove()?;

        let executable = self.extract_executable(executable_name).await?;
        self.archive.asset().remove()?;

        let digest = digest_asset(&executable).await?;
        self.store_executable_digest(&digest)?;

        Ok(digest)
    }

    fn discard_release_files(&self) {
        for asset in [self.checksums.asset(), self.archive.asset()] {
            if !asset.exists() {
                continue;
            }
            if let Err(err) = asset.remove() {
                warn!("failed to remove {}: {}", asset.name(), err);
            }
        }
    }

    async fn required_executable_digest(&self) -> Result<Digest> {
        if let Some(digest) = self.stored_executable_digest() {
            return Ok(digest);
        }

        self.download_and_verify_executable(self.executable.name())
            .await
    }

    fn stored_executable_digest(&self) -> Option<Digest> {
        match self
            .store
            .get_as::<VersionDigest>(VersionDigest::STORAGE_KEY)
        {
            Ok(Some(record)) if record.is_for(&self.required_version) => Some(record.digest),
            Ok(_) => None,
            Err(err) => {
                warn!("ignoring unreadable executable digest record: {}", err);
                None
            }
        }
    }

    fn store_executable_digest(&self, digest: &Digest) -> Result<()> {
        info!(
            "saving new digest for executable (version: {}, digest: \"{}…\")...",
            self.required_version,
            digest.short()
        );
        let record = VersionDigest::new(self.required_version.clone(), digest.clone());
        self.store.set_as(VersionDigest::STORAGE_KEY, &record)?;
        Ok(())
    }

    async fn verify_archive(&self) -> Result<()> {
        let required = self.required_archive_digest().await?;
        self.verify_file(self.archive.asset(), &required).await
    }

    async fn required_archive_digest(&self) -> Result<Digest> {
        let content = self.checksums.asset().content().await?;
        let manifest = String::from_utf8_lossy(&content);
        manifest::lookup_digest(
            &manifest,
            &manifest::archive_name(&self.required_version, self.platform),
        )
    }

    async fn verify_file(&self, file: &Asset, required: &Digest) -> Result<()> {
        info!("verifying {}...", file.name());

        let actual = digest_asset(file).await?;
        if &actual == required {
            return Ok(());
        }

        Err(VigilError::DigestMismatch {
            path: file.local_path(),
            expected: required.clone(),
            actual,
        })
    }

    async fn extract_executable(&self, executable_name: &str) -> Result<Asset> {
        info!(
            "extracting \"{}\" from \"{}\"...",
            executable_name,
            self.archive.asset().name()
        );

        let archive_path = self.archive.asset().local_path();
        let storage_dir = self.executable.storage_dir().to_path_buf();
        let name = executable_name.to_string();
        tokio::task::spawn_blocking(move || {
            extract::extract_entry(&archive_path, &name, &storage_dir)
        })
        .await
        .map_err(|e| VigilError::Internal(e.to_string()))??;

        Ok(Asset::new(executable_name, self.executable.storage_dir()))
    }
}
