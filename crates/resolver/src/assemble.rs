use crate::size::{PathMetrics, SizeProbe};
use kernel::run_blocking;
use protocol::models::{Candidate, ResolutionResult};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const TRASH_DIR_NAMES: &[&str] = &[".Trash", ".Trashes"];

/// Sorts by path and drops duplicates and strict descendants of a kept path.
pub fn collapse(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|left, right| left.path.cmp(&right.path));
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        // Component ordering keeps every descendant right after its ancestor.
        if let Some(last) = kept.last()
            && candidate.path.starts_with(&last.path)
        {
            continue;
        }
        kept.push(candidate);
    }
    kept
}

pub fn collapse_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    collapse(paths.into_iter().map(|path| Candidate::new(path, false)).collect())
        .into_iter()
        .map(|candidate| candidate.path)
        .collect()
}

pub fn is_in_trash(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(component, Component::Normal(name)
            if TRASH_DIR_NAMES.iter().any(|trash| name == *trash))
    })
}

/// Collapse, clear a lone Trash-resident survivor, then attach sizes.
pub async fn finalize_forward(
    candidates: Vec<Candidate>,
    probe: Option<Arc<dyn SizeProbe>>,
) -> ResolutionResult {
    let mut candidates = collapse(candidates);
    if candidates.len() == 1 && is_in_trash(&candidates[0].path) {
        tracing::debug!(
            event = "forward_trash_only_result_cleared",
            path = %candidates[0].path.display()
        );
        candidates.clear();
    }

    let Some(probe) = probe else {
        return ResolutionResult {
            candidates,
            ..ResolutionResult::default()
        };
    };

    let paths = candidates
        .iter()
        .map(|candidate| candidate.path.clone())
        .collect::<Vec<_>>();
    let metrics = run_blocking("resolver_size_probe", move || {
        Ok(paths
            .iter()
            .map(|path| probe.probe(path))
            .collect::<Vec<_>>())
    })
    .await
    .unwrap_or_else(|error| {
        tracing::warn!(
            event = "resolver_size_probe_failed",
            code = %error.code,
            detail = %error
        );
        Vec::new()
    });

    with_metrics(candidates, metrics)
}

fn with_metrics(
    mut candidates: Vec<Candidate>,
    metrics: Vec<Option<PathMetrics>>,
) -> ResolutionResult {
    let mut result = ResolutionResult::default();
    for (candidate, metric) in candidates.iter_mut().zip(metrics) {
        let Some(metric) = metric else {
            continue;
        };
        result.total_real_bytes = result
            .total_real_bytes
            .saturating_add(metric.size.real_bytes);
        result.total_logical_bytes = result
            .total_logical_bytes
            .saturating_add(metric.size.logical_bytes);
        candidate.size = Some(metric.size);
        candidate.icon = metric.icon;
    }
    result.candidates = candidates;
    result
}

pub fn finalize_orphans(candidates: Vec<Candidate>, cancelled: bool) -> ResolutionResult {
    ResolutionResult {
        candidates: collapse(candidates),
        cancelled,
        ..ResolutionResult::default()
    }
}

#[cfg(test)]
#[path = "../tests/assemble/assemble_tests.rs"]
mod assemble_tests;
