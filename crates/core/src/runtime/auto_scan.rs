use super::ScanScheduler;
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_api::{StateStore, StateStoreExt};

/// State key of the automatic scanning switch.
pub const ENABLED_KEY: &str = "isEnabled";

/// Whether automatic scanning is on. Defaults to on when nothing was stored.
pub fn is_enabled(store: &dyn StateStore) -> bool {
    match store.get_as::<bool>(ENABLED_KEY) {
        Ok(value) => value.unwrap_or(true),
        Err(err) => {
            warn!("ignoring unreadable {} flag: {}", ENABLED_KEY, err);
            true
        }
    }
}

pub fn set_enabled(store: &dyn StateStore, enabled: bool) -> Result<()> {
    store.set_as(ENABLED_KEY, &enabled)?;
    info!(
        "automatic scanning {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Binds the persisted switch to a [`ScanScheduler`].
pub struct AutoScan {
    store: Arc<dyn StateStore>,
    scheduler: ScanScheduler,
}

impl AutoScan {
    pub fn new(store: Arc<dyn StateStore>, scheduler: ScanScheduler) -> Self {
        Self { store, scheduler }
    }

    pub fn scheduler(&self) -> &ScanScheduler {
        &self.scheduler
    }

    pub fn is_enabled(&self) -> bool {
        is_enabled(self.store.as_ref())
    }

    /// Persist the switch, then start or stop listening to match.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        set_enabled(self.store.as_ref(), enabled)?;
        if enabled {
            self.scheduler.start()
        } else {
            self.scheduler.stop();
            Ok(())
        }
    }

    /// Start listening if the stored switch says so. Returns whether it did.
    pub fn restore(&self) -> Result<bool> {
        if !self.is_enabled() {
            info!("automatic scanning is disabled");
            return Ok(false);
        }
        self.scheduler.start()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use tempfile::TempDir;
    use vigil_api::ApiResult;

    fn noop_scheduler(root: &std::path::Path) -> ScanScheduler {
        let handler = || async { ApiResult::Ok(()) };
        ScanScheduler::new(root, vec!["**/package.json".to_string()], Arc::new(handler))
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let store = MemoryStore::new();
        assert!(is_enabled(&store));

        set_enabled(&store, false).unwrap();
        assert!(!is_enabled(&store));
    }

    #[test]
    fn test_unreadable_flag_counts_as_enabled() {
        let store = MemoryStore::new();
        store.set(ENABLED_KEY, json!("yes")).unwrap();
        assert!(is_enabled(&store));
    }

    #[tokio::test]
    async fn test_toggle_starts_and_stops_scheduler() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let auto_scan = AutoScan::new(store.clone(), noop_scheduler(temp.path()));

        assert!(auto_scan.restore().unwrap());
        assert!(auto_scan.scheduler().is_watching());

        auto_scan.set_enabled(false).unwrap();
        assert!(!auto_scan.scheduler().is_watching());
        assert_eq!(store.get_as::<bool>(ENABLED_KEY).unwrap(), Some(false));

        auto_scan.set_enabled(true).unwrap();
        assert!(auto_scan.scheduler().is_watching());
        auto_scan.scheduler().stop();
    }

    #[tokio::test]
    async fn test_restore_respects_disabled_flag() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        set_enabled(store.as_ref(), false).unwrap();

        let auto_scan = AutoScan::new(store, noop_scheduler(temp.path()));
        assert!(!auto_scan.restore().unwrap());
        assert!(!auto_scan.scheduler().is_watching());
    }
}
