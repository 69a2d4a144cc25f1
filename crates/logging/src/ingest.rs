use crate::{AppError, ResultExt};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

pub(super) fn cleanup_expired_logs_with_duration(
    log_dir: &Path,
    keep_duration: Duration,
    now: SystemTime,
) -> Result<usize, AppError> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("reading log directory: {}", log_dir.display()))
        .with_code("log_cleanup_read_dir_failed", "could not read the log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("reading log entry: {}", log_dir.display()))
            .with_code("log_cleanup_read_entry_failed", "could not read a log entry")
            .with_ctx("logDir", log_dir.display().to_string())?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let modified_at = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .with_context(|| format!("reading log modified time: {}", path.display()))
            .with_code("log_cleanup_metadata_failed", "could not read log metadata")
            .with_ctx("logPath", path.display().to_string())?;

        let elapsed = now.duration_since(modified_at).unwrap_or_default();
        if elapsed <= keep_duration {
            continue;
        }

        fs::remove_file(&path)
            .with_context(|| format!("removing expired log: {}", path.display()))
            .with_code("log_cleanup_remove_failed", "could not remove an expired log")
            .with_ctx("logPath", path.display().to_string())?;
        removed += 1;
    }

    Ok(removed)
}

pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> Result<(), AppError> {
    let keep_duration = Duration::from_secs(keep_days.saturating_mul(24 * 60 * 60));
    let _ = cleanup_expired_logs_with_duration(log_dir, keep_duration, SystemTime::now())?;
    Ok(())
}

/// Renders a path for log fields with the home directory folded to `~`.
pub fn sanitize_path(path: &Path) -> String {
    let home = std::env::var_os("HOME").filter(|value| !value.is_empty());
    sanitize_path_with_home(path, home.as_deref().map(Path::new))
}

pub(super) fn sanitize_path_with_home(path: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home
        && let Ok(relative) = path.strip_prefix(home)
    {
        if relative.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", relative.display());
    }
    path.display().to_string()
}
