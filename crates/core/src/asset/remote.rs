use super::Asset;
use crate::error::{Result, VigilError};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;
use url::Url;

const USER_AGENT: &str = concat!("vigil/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

/// Transport that materializes a release file on local disk.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch `url` into `dest`, replacing any existing file. Returns only once
    /// the body is fully written and the file closed.
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// HTTPS release source. Follows redirects, which release hosts use to hand
/// off to their CDN.
#[derive(Clone)]
pub struct HttpReleaseSource {
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpReleaseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReleaseSource").finish()
    }
}

impl HttpReleaseSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| VigilError::Internal(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReleaseSource for HttpReleaseSource {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        let network = |source| VigilError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url.clone()).send().await.map_err(network)?;
        if !response.status().is_success() {
            return Err(VigilError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(network(e));
                }
            };
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(())
    }
}

/// A release file published under
/// `https://{repository_url}/releases/download/v{version}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    asset: Asset,
    version: String,
    repository_url: String,
}

impl RemoteAsset {
    pub fn new(
        name: impl Into<String>,
        storage_dir: impl Into<std::path::PathBuf>,
        version: impl Into<String>,
        repository_url: impl Into<String>,
    ) -> Self {
        Self {
            asset: Asset::new(name, storage_dir),
            version: version.into(),
            repository_url: repository_url.into(),
        }
    }

    /// The local side of this release file.
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn url(&self) -> Result<Url> {
        let url = format!(
            "https://{}/releases/download/v{}/{}",
            self.repository_url.trim_end_matches('/'),
            self.version,
            self.asset.name()
        );
        Ok(Url::parse(&url)?)
    }

    /// Download into storage, overwriting a previous copy.
    pub async fn download(&self, source: &dyn ReleaseSource) -> Result<()> {
        let url = self.url()?;
        info!("downloading {}...", url);
        tokio::fs::create_dir_all(self.asset.storage_dir()).await?;
        source.fetch(&url, &self.asset.local_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_url() {
        let asset = RemoteAsset::new(
            "grype_0.42.0_linux_amd64.tar.gz",
            "/tmp/vigil",
            "0.42.0",
            "github.com/anchore/grype/",
        );
        assert_eq!(
            asset.url().unwrap().as_str(),
            "https://github.com/anchore/grype/releases/download/v0.42.0/grype_0.42.0_linux_amd64.tar.gz"
        );
        assert_eq!(
            asset.asset().local_path(),
            Path::new("/tmp/vigil/grype_0.42.0_linux_amd64.tar.gz")
        );
    }

    #[test]
    fn test_http_source_builds() {
        assert!(HttpReleaseSource::new().is_ok());
    }
}
