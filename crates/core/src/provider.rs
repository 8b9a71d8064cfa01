use crate::asset::{Asset, ReleaseSource, RemoteAsset};
use crate::config::GrypeConfig;
use crate::error::Result;
use crate::platform::Platform;
use crate::scanner::Grype;
use crate::verify::{Verifier, manifest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use vigil_api::StateStore;

/// Hands out a scanner whose executable matches the digest on record.
///
/// Each call to [`get`](Self::get) ends in one of three ways: the local
/// executable is reused, a corrupted one is deleted and provisioned again
/// (once), or a missing one is provisioned from scratch.
pub struct ExecutableProvider {
    config: GrypeConfig,
    platform: Platform,
    storage_dir: PathBuf,
    archive: RemoteAsset,
    executable: Asset,
    store: Arc<dyn StateStore>,
    source: Arc<dyn ReleaseSource>,
}

impl ExecutableProvider {
    pub const EXECUTABLE_NAME: &'static str = manifest::TOOL_NAME;

    pub fn new(
        config: GrypeConfig,
        platform: Platform,
        storage_dir: impl Into<PathBuf>,
        store: Arc<dyn StateStore>,
        source: Arc<dyn ReleaseSource>,
    ) -> Self {
        let storage_dir = storage_dir.into();
        let archive = RemoteAsset::new(
            manifest::archive_name(&config.required_version, platform),
            storage_dir.clone(),
            config.required_version.clone(),
            config.repository_url.clone(),
        );
        let executable = Asset::new(Self::EXECUTABLE_NAME, storage_dir.clone());

        Self {
            config,
            platform,
            storage_dir,
            archive,
            executable,
            store,
            source,
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.executable.local_path()
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub async fn get(&self) -> Result<Grype> {
        let verifier = Verifier::new(
            &self.config,
            self.platform,
            self.archive.clone(),
            self.executable.clone(),
            self.store.clone(),
            self.source.clone(),
        );

        if self.executable.exists() {
            info!("found grype executable");
            match verifier.verify_executable(&self.executable).await {
                Ok(()) => return Ok(self.new_grype()),
                Err(err) if err.is_digest_mismatch() => {
                    info!("grype executable has incorrect digest");
                    self.executable.remove()?;
                }
                Err(err) => return Err(err),
            }
        } else {
            info!("grype executable not present");
        }

        verifier
            .download_and_verify_executable(Self::EXECUTABLE_NAME)
            .await?;

        Ok(self.new_grype())
    }

    fn new_grype(&self) -> Grype {
        Grype::new(self.executable.local_path(), &self.storage_dir)
    }
}
