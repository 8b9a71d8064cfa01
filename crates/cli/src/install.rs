use tracing::info;
use vigil_api::{StateStoreExt, VersionDigest};
use vigil_core::config::VigilConfig;

pub async fn run(config: &VigilConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = vigil_runtime::open_store(config);
    let provider = vigil_runtime::build_provider_with_store(config, store.clone())?;

    info!(
        "Ensuring grype {} in {}...",
        config.grype.required_version,
        provider.storage_dir().display()
    );
    let grype = provider.get().await?;

    println!("Executable: {}", grype.executable().display());
    println!("Version:    {}", config.grype.required_version);
    if let Some(record) = store.get_as::<VersionDigest>(VersionDigest::STORAGE_KEY)? {
        println!("SHA-256:    {}", record.digest);
    }
    Ok(())
}
