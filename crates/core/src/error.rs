use std::path::PathBuf;
use thiserror::Error;
use vigil_api::{ApiError, Digest};

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid release URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Download of {url} failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Digest mismatch for file \"{}\" (expected {expected}, actual {actual})", path.display())]
    DigestMismatch {
        path: PathBuf,
        expected: Digest,
        actual: Digest,
    },
    #[error("Unable to find a unique checksum for {archive} in manifest ({matches} matching lines)")]
    ManifestEntryNotFound { archive: String, matches: usize },
    #[error("Archive {archive} does not contain an entry named {entry}")]
    ArchiveEntryNotFound { archive: String, entry: String },
    #[error(
        "Scanner executable not found at {}; reinstall it or reload the workspace",
        path.display()
    )]
    ExecutableNotFound { path: PathBuf },
    #[error("Scanner exited with code {code}: {message}")]
    ExitCodeNonZero { code: i32, message: String },
    #[error("Scanner produced malformed output: {0}")]
    MalformedOutput(String),
    #[error("Scanning the root directory ('/') is not supported")]
    RootDirectoryScan,
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VigilError {
    /// Integrity failures are the only errors that justify discarding the
    /// cached executable and provisioning again.
    pub fn is_digest_mismatch(&self) -> bool {
        matches!(self, VigilError::DigestMismatch { .. })
    }
}

impl From<VigilError> for ApiError {
    fn from(err: VigilError) -> Self {
        match err {
            VigilError::Api(inner) => inner,
            other => ApiError::Scan(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VigilError>;
