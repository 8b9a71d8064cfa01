use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber: a daily-rolled file under `<base_dir>/logs`
/// named after `component`, plus an optional colored stderr layer.
///
/// `RUST_LOG` overrides the default `info` filter. The returned guard flushes
/// the file writer on drop and must be held for the life of the process.
pub fn init_logging(base_dir: &Path, component: &str, to_stderr: bool) -> WorkerGuard {
    let log_dir = base_dir.join("logs");
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "vigil: cannot create log directory {}: {}",
            log_dir.display(),
            err
        );
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, component));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already installed, keeping it");
    }

    guard
}
