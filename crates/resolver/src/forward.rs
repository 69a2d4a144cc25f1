use crate::assemble::{finalize_forward, is_in_trash};
use crate::container::{group_container_for, sandbox_containers_for};
use crate::identity::AppIdentity;
use crate::roots::ResolverRoots;
use crate::rules::{RuleDecision, RuleStore, RuleTable, expand_home};
use crate::scan::{ScanEntry, Verdict, walk_root};
use crate::size::SizeProbe;
use kernel::{fan_out_blocking, run_blocking};
use protocol::models::{AppDescriptor, Candidate, ResolutionResult, SearchRoot};
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

const WRAPPER_DIR: &str = "Wrapper";

type CandidateMap = Arc<Mutex<BTreeMap<PathBuf, Candidate>>>;

/// Path seeded for the bundle itself. Wrapped bundles (`Outer.app/Wrapper/Inner.app`)
/// seed the outer bundle; anything in the Trash is never seeded.
pub fn seed_bundle_path(bundle_path: &Path) -> Option<PathBuf> {
    if bundle_path.as_os_str().is_empty() || is_in_trash(bundle_path) {
        return None;
    }
    let wrapped = bundle_path
        .components()
        .any(|component| component == Component::Normal(OsStr::new(WRAPPER_DIR)));
    if wrapped {
        return bundle_path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
    }
    Some(bundle_path.to_path_buf())
}

/// Skip table, then conditions, then the loose token heuristic.
pub fn classify_forward(table: &RuleTable, identity: &AppIdentity, entry: &str) -> Verdict {
    if entry.is_empty() || table.is_skipped(entry) {
        return Verdict::Reject;
    }
    match table.evaluate_forward(identity, entry) {
        Some(RuleDecision::Accept) => Verdict::Accept,
        Some(RuleDecision::Reject) => Verdict::Reject,
        None if identity.loosely_matches(entry) => Verdict::Accept,
        None => Verdict::Pass,
    }
}

fn lock_candidates(
    candidates: &Mutex<BTreeMap<PathBuf, Candidate>>,
) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, Candidate>> {
    candidates
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn scan_forward_root(
    root: &SearchRoot,
    table: &RuleTable,
    identity: &AppIdentity,
    candidates: &Mutex<BTreeMap<PathBuf, Candidate>>,
) -> usize {
    let mut accepted = 0usize;
    walk_root(root, None, |entry: &ScanEntry<'_>| {
        if !entry.is_supported_type() {
            return Verdict::Reject;
        }
        if lock_candidates(candidates).contains_key(entry.path()) {
            return Verdict::Reject;
        }
        let verdict = classify_forward(table, identity, &entry.name);
        if verdict == Verdict::Accept {
            accepted += 1;
            lock_candidates(candidates)
                .entry(entry.path().to_path_buf())
                .or_insert_with(|| Candidate::new(entry.path(), entry.is_dir()));
        }
        verdict
    });
    accepted
}

fn locate_containers(identity: &AppIdentity, roots: &ResolverRoots) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Some(group_root) = roots.group_containers_root.as_deref()
        && let Some(path) = group_container_for(group_root, &identity.bundle_identifier)
    {
        found.push(path);
    }
    if let Some(containers_root) = roots.containers_root.as_deref() {
        found.extend(sandbox_containers_for(
            containers_root,
            &identity.bundle_identifier,
        ));
    }
    found
}

/// Adds existing `include_force` paths and removes `exclude_force` paths of every
/// condition that applies to the app.
fn apply_force_rules(
    candidates: &mut BTreeMap<PathBuf, Candidate>,
    table: &RuleTable,
    identity: &AppIdentity,
    home: Option<&Path>,
) {
    let mut excluded = HashSet::new();
    for condition in table.conditions_for_app(identity) {
        for path in &condition.include_force {
            let path = expand_home(path, home);
            if path.symlink_metadata().is_ok() {
                candidates
                    .entry(path.clone())
                    .or_insert_with(|| Candidate::from_path(&path));
            }
        }
        excluded.extend(
            condition
                .exclude_force
                .iter()
                .map(|path| expand_home(path, home)),
        );
    }
    candidates.retain(|path, _| !excluded.contains(path));
}

/// Every path under the search roots that plausibly belongs to `app`.
pub async fn resolve_app_files(
    app: &AppDescriptor,
    roots: &ResolverRoots,
    rules: &RuleStore,
    probe: Option<Arc<dyn SizeProbe>>,
) -> ResolutionResult {
    let identity = Arc::new(AppIdentity::from_descriptor(app));
    let table = Arc::new(rules.read().await);
    let candidates: CandidateMap = Arc::new(Mutex::new(BTreeMap::new()));

    if let Some(seed) = seed_bundle_path(&app.bundle_path)
        && seed.symlink_metadata().is_ok()
    {
        lock_candidates(&candidates).insert(seed.clone(), Candidate::from_path(&seed));
    }

    let scan_roots = roots.search_roots.clone();
    let root_count = scan_roots.len();
    let accepted = {
        let table = Arc::clone(&table);
        let identity = Arc::clone(&identity);
        let candidates = Arc::clone(&candidates);
        fan_out_blocking("forward_root_scan", scan_roots, move |root| {
            scan_forward_root(&root, &table, &identity, &candidates)
        })
        .await
    };

    let containers = {
        let identity = Arc::clone(&identity);
        let roots = roots.clone();
        run_blocking("forward_container_lookup", move || {
            Ok(locate_containers(&identity, &roots))
        })
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(
                event = "forward_container_lookup_failed",
                code = %error.code,
                detail = %error
            );
            Vec::new()
        })
    };

    let merged = {
        let mut merged = std::mem::take(&mut *lock_candidates(&candidates));
        for path in containers {
            merged
                .entry(path.clone())
                .or_insert_with(|| Candidate::new(path, true));
        }
        apply_force_rules(&mut merged, &table, &identity, roots.home.as_deref());
        merged
    };
    drop(table);

    tracing::info!(
        event = "forward_resolution_done",
        identifier = %app.bundle_identifier,
        roots = root_count,
        scanned_hits = accepted.iter().sum::<usize>(),
        candidates = merged.len()
    );

    finalize_forward(merged.into_values().collect(), probe).await
}

#[cfg(test)]
#[path = "../tests/scan/forward_tests.rs"]
mod forward_tests;
