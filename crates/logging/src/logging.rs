use crate::{AppError, ResultExt};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[path = "config.rs"]
mod config;
#[path = "ingest.rs"]
mod ingest;

pub use ingest::{cleanup_expired_logs, sanitize_path};

const DEFAULT_KEEP_DAYS: u64 = 7;
const LOG_FILE_PREFIX: &str = "residue";
const LOG_FILE_SUFFIX: &str = "log";
const LOG_LEVEL_ENV: &str = "RESIDUE_LOG_LEVEL";

/// Keeps the non-blocking file writer alive; drop it last so buffered lines flush.
#[derive(Debug)]
pub struct LoggingGuard {
    log_dir: PathBuf,
    level: String,
    _worker: WorkerGuard,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

pub fn resolve_log_level() -> String {
    config::resolve_log_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}

pub fn init_logging(app_data_dir: &Path, console: bool) -> Result<LoggingGuard, AppError> {
    let log_dir = app_data_dir.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory: {}", log_dir.display()))
        .with_code("log_dir_create_failed", "could not create the log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;
    cleanup_expired_logs(&log_dir, DEFAULT_KEEP_DAYS)?;

    let file_appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(&log_dir)
        .with_context(|| format!("creating log writer: {}", log_dir.display()))
        .with_code("log_appender_create_failed", "could not create the log writer")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    let level = resolve_log_level();
    if !tracing::dispatcher::has_been_set() {
        let env_filter = EnvFilter::new(level.clone());
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(file_writer)
            .with_current_span(false)
            .with_span_list(false);
        let console_layer = console.then(|| {
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(true)
                .with_writer(std::io::stderr)
        });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()
            .with_context(|| format!("installing log subscriber: level={level}"))
            .with_code("log_subscriber_init_failed", "could not install the log subscriber")
            .with_ctx("logLevel", level.clone())?;
    }

    Ok(LoggingGuard {
        log_dir,
        level,
        _worker: worker_guard,
    })
}

#[cfg(test)]
#[path = "../tests/logging/logging_tests.rs"]
mod logging_tests;
