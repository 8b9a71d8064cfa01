//! Long-running pieces: the file-event driven scan scheduler and the
//! persisted switch that turns it on and off.

mod auto_scan;
mod watch;

pub use auto_scan::{AutoScan, ENABLED_KEY, is_enabled, set_enabled};
pub use watch::ScanScheduler;
