pub mod asset;
pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod provider;
pub mod runtime;
pub mod scanner;
pub mod store;
pub mod verify;

pub use config::{GrypeConfig, VigilConfig};
pub use error::{Result, VigilError};
pub use platform::Platform;
pub use provider::ExecutableProvider;
pub use runtime::{AutoScan, ScanScheduler};
pub use scanner::Grype;
