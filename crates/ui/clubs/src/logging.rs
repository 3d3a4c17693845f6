use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use lazy_static::lazy_static;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config;

lazy_static! {
    pub static ref LOG_ENV: String = format!("{}_LOG_LEVEL", config::PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

#[cfg(debug_assertions)]
const DEFAULT_LEVEL: &str = "info";
#[cfg(not(debug_assertions))]
const DEFAULT_LEVEL: &str = "warn";

/// File logging only; the terminal belongs to the UI. The returned guard
/// flushes the writer on drop and must live as long as the program.
pub fn init(data_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(data_dir)
        .wrap_err_with(|| format!("creating log directory {}", data_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(data_dir, LOG_FILE.as_str());
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // CLUBS_LOG_LEVEL wins over RUST_LOG
    let directives = std::env::var(LOG_ENV.as_str())
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|_| format!("{}={DEFAULT_LEVEL},club_core={DEFAULT_LEVEL}", env!("CARGO_CRATE_NAME")));
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .parse_lossy(directives);

    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(guard)
}
