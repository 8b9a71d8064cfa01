//! Invocation of the provisioned scanner executable.

pub mod patterns;
pub mod process;

pub use patterns::StaticGlobPatterns;
pub use process::ProcessOutput;

use crate::error::{Result, VigilError};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vigil_api::{GlobPatternSource, ScanReport};

/// Handle to a verified scanner executable.
#[derive(Debug, Clone)]
pub struct Grype {
    executable: PathBuf,
    db_dir: PathBuf,
}

impl Grype {
    pub fn new(executable: impl Into<PathBuf>, storage_dir: &Path) -> Self {
        Self {
            executable: executable.into(),
            db_dir: storage_dir.join("db"),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Refresh the vulnerability database. Best effort: failures are logged
    /// and the next scan runs against whatever database is present.
    pub async fn update_db(&self) {
        if let Err(err) = self.try_update_db().await {
            warn!("vulnerability database update failed: {}", err);
        }
    }

    async fn try_update_db(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.db_dir).await?;
        self.run(["db", "update", "-vv"]).await?.into_checked()?;
        Ok(())
    }

    /// Scan `directory` and return the matches the scanner reports.
    pub async fn scan(&self, directory: &Path) -> Result<ScanReport> {
        let directory = tokio::fs::canonicalize(directory).await?;
        if directory.parent().is_none() {
            return Err(VigilError::RootDirectoryScan);
        }

        self.update_db().await;

        info!("scanning {}...", directory.display());
        let mut target = OsString::from("dir:");
        target.push(directory.as_os_str());
        let output = self
            .run([target.as_os_str(), OsStr::new("-o"), OsStr::new("json"), OsStr::new("-v")])
            .await?
            .into_checked()?;

        let report = process::parse_report(&output.stdout)?;
        info!("scan of {} found {}", directory.display(), report.summary());
        Ok(report)
    }

    pub fn glob_patterns(&self) -> Vec<String> {
        StaticGlobPatterns.glob_patterns()
    }

    fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("GRYPE_DB_CACHE_DIR", self.db_dir.display().to_string()),
            ("GRYPE_DB_AUTO_UPDATE", "false".to_string()),
            ("GRYPE_CHECK_FOR_APP_UPDATE", "false".to_string()),
            ("GRYPE_LOG_STRUCTURED", "true".to_string()),
        ]
    }

    async fn run<I, S>(&self, args: I) -> Result<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        process::run(&self.executable, args, &self.env()).await
    }
}

impl GlobPatternSource for Grype {
    fn glob_patterns(&self) -> Vec<String> {
        Grype::glob_patterns(self)
    }
}
