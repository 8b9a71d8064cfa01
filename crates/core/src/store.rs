//! [`StateStore`] implementations: an in-memory map for tests and embedding,
//! and a single JSON document on disk for the CLI.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use vigil_api::{ApiError, ApiResult, StateStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> ApiResult<Option<Value>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> ApiResult<()> {
        self.values().insert(key.to_string(), value);
        Ok(())
    }
}

/// Key/value state persisted as one JSON object.
///
/// Every access reads the file afresh and every `set` rewrites it with only
/// its own key changed, so several processes sharing the file keep each
/// other's values. Writes go through a sibling temp file so a crash never
/// leaves half a document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ApiResult<Map<String, Value>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no state file at {}", self.path.display());
                return Ok(Map::new());
            }
            Err(e) => return Err(state_error(&self.path, e)),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&content).map_err(|e| state_error(&self.path, e))? {
            Value::Object(values) => Ok(values),
            _ => Err(ApiError::State(format!(
                "{}: expected a JSON object",
                self.path.display()
            ))),
        }
    }

    fn persist(&self, values: &Map<String, Value>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| state_error(&self.path, e))?;
        }
        let content =
            serde_json::to_vec_pretty(values).map_err(|e| state_error(&self.path, e))?;

        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        std::fs::write(&tmp, content).map_err(|e| state_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| state_error(&self.path, e))
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> ApiResult<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> ApiResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        values.insert(key.to_string(), value);
        self.persist(&values)
    }
}

fn state_error(path: &Path, err: impl std::fmt::Display) -> ApiError {
    ApiError::State(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use vigil_api::StateStoreExt;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("isEnabled", json!(false)).unwrap();
        assert_eq!(store.get_as::<bool>("isEnabled").unwrap(), Some(false));
    }

    #[test]
    fn test_json_store_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.json");

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("isEnabled").unwrap(), None);
        store.set("isEnabled", json!(false)).unwrap();
        store.set("other", json!({"a": 1})).unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get_as::<bool>("isEnabled").unwrap(), Some(false));
        assert_eq!(reopened.get("other").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_json_store_keeps_writes_from_other_instances() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        let watcher = JsonFileStore::new(&path);
        let other = JsonFileStore::new(&path);

        assert_eq!(watcher.get("isEnabled").unwrap(), None);
        other.set("isEnabled", json!(false)).unwrap();
        assert_eq!(watcher.get_as::<bool>("isEnabled").unwrap(), Some(false));

        watcher
            .set("requiredVersionDigest", json!({"version": "0.42.0"}))
            .unwrap();

        let fresh = JsonFileStore::new(&path);
        assert_eq!(fresh.get_as::<bool>("isEnabled").unwrap(), Some(false));
        assert_eq!(
            fresh.get("requiredVersionDigest").unwrap(),
            Some(json!({"version": "0.42.0"}))
        );
    }

    #[test]
    fn test_json_store_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "\n").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_json_store_rejects_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("anything"), Err(ApiError::State(_))));

        std::fs::write(&path, "[1, 2]").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("anything"), Err(ApiError::State(_))));
    }
}
