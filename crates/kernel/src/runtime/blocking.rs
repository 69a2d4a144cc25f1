use crate::{AppError, AppResult};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

pub async fn run_blocking<T, F>(label: &'static str, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);
    match handle.await {
        Ok(result) => result,
        Err(error) => Err(join_error_to_app_error(label, &error)),
    }
}

/// Runs `job` once per item on the blocking pool and waits for every task.
///
/// Outputs arrive in completion order. A task that panics or is cancelled is logged
/// and left out; the others still complete, so the join is a hard barrier that never
/// fails as a whole.
pub async fn fan_out_blocking<I, T, F>(label: &'static str, items: Vec<I>, job: F) -> Vec<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> T + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let mut tasks = JoinSet::new();
    for item in items {
        let job = Arc::clone(&job);
        tasks.spawn_blocking(move || job(item));
    }

    let mut outputs = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(output) => outputs.push(output),
            Err(error) => {
                let mapped = join_error_to_app_error(label, &error);
                tracing::warn!(
                    event = "blocking_fan_out_task_failed",
                    blocking_task = label,
                    code = %mapped.code,
                    detail = %join_error_detail(&error)
                );
            }
        }
    }
    outputs
}

fn join_error_to_app_error(label: &'static str, error: &JoinError) -> AppError {
    if error.is_cancelled() {
        return AppError::new("blocking_task_canceled", "blocking task was cancelled")
            .with_context("blockingTask", label);
    }

    if error.is_panic() {
        return AppError::new("blocking_task_panicked", "blocking task panicked")
            .with_context("joinError", join_error_detail(error))
            .with_context("blockingTask", label);
    }

    AppError::new("blocking_task_failed", "blocking task failed")
        .with_context("joinError", join_error_detail(error))
        .with_context("blockingTask", label)
}

fn join_error_detail(error: &JoinError) -> String {
    let debug_text = format!("{error:?}");
    if debug_text.trim().is_empty() {
        "join error".to_string()
    } else {
        debug_text
    }
}

#[cfg(test)]
#[path = "../../tests/runtime/blocking_tests.rs"]
mod blocking_tests;
