use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing to a log file.
///
/// - File only: the terminal UI owns stdout/stderr while running
/// - Default level: info, debug for this crate; override via RUST_LOG
///
/// Keep the returned guard alive for the life of the process, otherwise
/// buffered lines are lost on exit.
pub fn init(log_path: &Path) -> Result<WorkerGuard> {
    let dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {:?}", dir))?;

    let file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("money-tracker.log"));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,money_tracker=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(non_blocking),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Tracing initialized");
    Ok(guard)
}
