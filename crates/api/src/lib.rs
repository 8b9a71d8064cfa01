pub mod error;
pub mod lifecycle;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use lifecycle::{GlobPatternSource, RescanHandler};
pub use models::*;
pub use store::{StateStore, StateStoreExt};
