use tracing::info;
use vigil_core::config::VigilConfig;

pub async fn run(config: &VigilConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = vigil_runtime::build_provider(config)?;
    let grype = provider.get().await?;

    info!("Updating vulnerability database in {}...", grype.db_dir().display());
    grype.update_db().await;
    info!("Database update finished.");
    Ok(())
}
