use vigil_core::config::VigilConfig;
use vigil_core::runtime;

pub fn run(config: &VigilConfig, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = vigil_runtime::open_store(config);
    runtime::set_enabled(store.as_ref(), enabled)?;
    println!(
        "Automatic scanning {}.",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
