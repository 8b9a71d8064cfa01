use std::sync::Arc;
use vigil_api::StateStore;
use vigil_core::asset::HttpReleaseSource;
use vigil_core::config::VigilConfig;
use vigil_core::platform::Platform;
use vigil_core::provider::ExecutableProvider;
use vigil_core::store::JsonFileStore;

/// Opens the state file shared by every command.
pub fn open_store(config: &VigilConfig) -> Arc<dyn StateStore> {
    Arc::new(JsonFileStore::new(config.state_path()))
}

/// Assembles a provider for the host platform that downloads over HTTPS and
/// keeps its digest record in the state file.
pub fn build_provider(config: &VigilConfig) -> vigil_core::Result<ExecutableProvider> {
    build_provider_with_store(config, open_store(config))
}

pub fn build_provider_with_store(
    config: &VigilConfig,
    store: Arc<dyn StateStore>,
) -> vigil_core::Result<ExecutableProvider> {
    let platform = Platform::detect()?;
    tracing::debug!("host platform: {}", platform);

    let source = HttpReleaseSource::new()?;
    Ok(ExecutableProvider::new(
        config.grype.clone(),
        platform,
        config.storage_dir(),
        store,
        Arc::new(source),
    ))
}

/// Initializes logging for a specific component under the configured base
/// directory. Only the CLI-facing components echo to stderr.
pub fn init_logging(config: &VigilConfig, component: &str, to_stderr: bool) -> impl Drop {
    vigil_core::logging::init_logging(&config.base_dir, component, to_stderr)
}
