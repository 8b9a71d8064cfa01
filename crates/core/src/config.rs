use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REPOSITORY_URL: &str = "github.com/anchore/grype";
pub const DEFAULT_GRYPE_VERSION: &str = "0.42.0";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Where and which scanner release to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrypeConfig {
    /// Host and path of the release repository, without scheme.
    pub repository_url: String,
    /// Release version without the leading `v`.
    pub required_version: String,
}

impl Default for GrypeConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            required_version: DEFAULT_GRYPE_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VigilConfig {
    pub grype: GrypeConfig,
    /// Holds the executable, its database cache, state and logs.
    pub base_dir: PathBuf,
    pub debounce: Duration,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            grype: GrypeConfig::default(),
            base_dir: Self::default_base_dir(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl VigilConfig {
    /// `~/.vigil`, or `./.vigil` when no home directory can be determined.
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vigil")
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.grype.required_version = version.into();
        self
    }

    pub fn with_repository(mut self, repository_url: impl Into<String>) -> Self {
        self.grype.repository_url = repository_url.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn storage_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.base_dir.join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VigilConfig::default();
        assert_eq!(config.grype.repository_url, "github.com/anchore/grype");
        assert_eq!(config.debounce, Duration::from_secs(1));
        assert!(config.base_dir.ends_with(".vigil"));
    }

    #[test]
    fn test_overrides() {
        let config = VigilConfig::default()
            .with_base_dir("/tmp/vigil")
            .with_version("0.50.1")
            .with_repository("example.com/fork/grype");
        assert_eq!(config.storage_dir(), Path::new("/tmp/vigil"));
        assert_eq!(config.state_path(), Path::new("/tmp/vigil/state.json"));
        assert_eq!(config.grype.required_version, "0.50.1");
        assert_eq!(config.grype.repository_url, "example.com/fork/grype");
    }
}
