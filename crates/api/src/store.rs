use crate::{ApiError, ApiResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Narrow key/value capability standing in for the host's global state.
///
/// Values are JSON so that any host store (a file, an editor memento, memory)
/// can back it without knowing the record types.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> ApiResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> ApiResult<()>;
}

/// Typed access on top of [`StateStore`].
pub trait StateStoreExt {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> ApiResult<Option<T>>;

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> ApiResult<()>;
}

impl<S: StateStore + ?Sized> StateStoreExt for S {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> ApiResult<Option<T>> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::State(format!("malformed value for {key}: {e}"))),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> ApiResult<()> {
        let value = serde_json::to_value(value).map_err(|e| ApiError::State(e.to_string()))?;
        self.set(key, value)
    }
}
