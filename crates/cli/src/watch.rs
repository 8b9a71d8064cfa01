use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_api::ApiResult;
use vigil_core::config::VigilConfig;
use vigil_core::runtime::{self, AutoScan, ScanScheduler};

pub async fn run(config: &VigilConfig, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = vigil_runtime::open_store(config);
    if !runtime::is_enabled(store.as_ref()) {
        info!("Automatic scanning is disabled. Run `vigil enable` to turn it on.");
        return Ok(());
    }

    let provider = Arc::new(vigil_runtime::build_provider_with_store(config, store.clone())?);
    let grype = provider.get().await?;

    info!("Initial scan of {}...", path.display());
    match grype.scan(&path).await {
        Ok(report) => info!("{}: {}", path.display(), report.summary()),
        Err(e) => warn!("Initial scan failed: {}", e),
    }

    // Re-resolve the executable on every rescan so a deleted or tampered
    // binary is repaired before it runs.
    let handler = {
        let provider = provider.clone();
        let root = path.clone();
        move || {
            let provider = provider.clone();
            let root = root.clone();
            async move {
                let grype = provider.get().await?;
                let report = grype.scan(&root).await?;
                info!("{}: {}", root.display(), report.summary());
                ApiResult::Ok(())
            }
        }
    };

    let scheduler = ScanScheduler::from_source(&path, &grype, Arc::new(handler))
        .with_window(config.debounce);
    let auto_scan = AutoScan::new(store, scheduler);
    auto_scan.restore()?;

    info!("Watching {} for package changes.", path.display());
    info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    auto_scan.scheduler().stop();
    info!("Watcher stopped.");

    Ok(())
}
