use crate::ApiResult;
use async_trait::async_trait;
use std::future::Future;

/// Callback bound to the scan scheduler. Invoked once per debounce window.
#[async_trait]
pub trait RescanHandler: Send + Sync {
    async fn rescan(&self) -> ApiResult<()>;
}

#[async_trait]
impl<F, Fut> RescanHandler for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<()>> + Send + 'static,
{
    async fn rescan(&self) -> ApiResult<()> {
        (self)().await
    }
}

/// Source of the file patterns whose changes should trigger a rescan.
pub trait GlobPatternSource: Send + Sync {
    fn glob_patterns(&self) -> Vec<String>;
}
