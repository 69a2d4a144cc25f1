use crate::assemble::finalize_orphans;
use crate::container::ContainerIndex;
use crate::identity::AppIdentity;
use crate::normalize::is_uuid_name;
use crate::roots::ResolverRoots;
use crate::rules::{RuleDecision, RuleStore, RuleTable, evaluate_condition, expand_home};
use crate::scan::{ScanEntry, Verdict, walk_root};
use kernel::{ScanCancel, fan_out_blocking, run_blocking};
use protocol::models::{AppDescriptor, Candidate, Condition, ResolutionResult, SearchRoot};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

const ORPHAN_CHANNEL_CAPACITY: usize = 256;

pub type BatchSink = Box<dyn FnMut(&[Candidate]) + Send>;

/// When survivors become visible to the caller. Both modes return the same result.
pub enum OrphanMode {
    Buffered,
    /// Flushes every `batch_size` survivors to `on_batch`, plus a final partial batch.
    Streaming {
        batch_size: usize,
        on_batch: BatchSink,
    },
}

impl std::fmt::Debug for OrphanMode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered => formatter.write_str("Buffered"),
            Self::Streaming { batch_size, .. } => formatter
                .debug_struct("Streaming")
                .field("batch_size", batch_size)
                .finish_non_exhaustive(),
        }
    }
}

/// Why an orphan candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanRejection {
    UserExcluded,
    ContainerUuid,
    Skipped,
    UnsupportedType,
    InstalledApp,
    ClaimedByRule,
}

/// Lowercased, `~`-expanded, trailing-slash-free path text used for exclusion checks.
pub fn exclusion_key(path: &Path, home: Option<&Path>) -> String {
    let expanded = expand_home(path, home);
    let text = expanded.to_string_lossy().to_lowercase();
    let trimmed = text.trim().trim_end_matches('/');
    if trimmed.is_empty() && text.starts_with('/') {
        return "/".to_string();
    }
    trimmed.to_string()
}

/// Everything the orphan classifier knows about installed apps, built once per pass.
#[derive(Debug, Default)]
pub struct InstalledSet {
    identifiers: HashSet<String>,
    tokens: Vec<String>,
    claiming_conditions: Vec<Condition>,
    claimed_paths: HashSet<PathBuf>,
    exclusions: Vec<String>,
    home: Option<PathBuf>,
}

impl InstalledSet {
    pub fn new(
        installed: &[AppDescriptor],
        table: &RuleTable,
        exclusions: &[String],
        home: Option<&Path>,
    ) -> Self {
        let identities = installed
            .iter()
            .map(AppIdentity::from_descriptor)
            .collect::<Vec<_>>();

        let mut tokens = identities
            .iter()
            .flat_map(|identity| identity.ownership_tokens().map(ToString::to_string))
            .collect::<Vec<_>>();
        tokens.sort();
        tokens.dedup();

        let mut seen_keys = HashSet::new();
        let claiming_conditions = identities
            .iter()
            .filter(|identity| !identity.is_web_app)
            .flat_map(|identity| table.conditions_claiming(&identity.identifier))
            .filter(|condition| seen_keys.insert(condition.key.clone()))
            .cloned()
            .collect::<Vec<_>>();
        let claimed_paths = claiming_conditions
            .iter()
            .flat_map(|condition| condition.include_force.iter())
            .map(|path| expand_home(path, home))
            .collect();

        Self {
            identifiers: identities
                .iter()
                .map(|identity| identity.identifier.clone())
                .filter(|identifier| !identifier.is_empty())
                .collect(),
            tokens,
            claiming_conditions,
            claimed_paths,
            exclusions: exclusions
                .iter()
                .map(|value| exclusion_key(Path::new(value.trim()), home))
                .filter(|value| !value.is_empty())
                .collect(),
            home: home.map(Path::to_path_buf),
        }
    }

    fn is_user_excluded(&self, path: &Path) -> bool {
        if self.exclusions.is_empty() {
            return false;
        }
        let key = exclusion_key(path, self.home.as_deref());
        self.exclusions
            .iter()
            .any(|exclusion| key == *exclusion || key.contains(exclusion.as_str()))
    }

    fn owns(&self, entry: &str, path: &Path, containers: &ContainerIndex) -> bool {
        if self.tokens.iter().any(|token| entry.contains(token.as_str())) {
            return true;
        }
        containers
            .owner_of(path)
            .is_some_and(|owner| self.identifiers.contains(owner))
    }

    fn claims(&self, entry: &str, path: &Path) -> bool {
        self.claimed_paths.contains(path)
            || self.claiming_conditions.iter().any(|condition| {
                evaluate_condition(condition, entry) == Some(RuleDecision::Accept)
            })
    }

    /// Applies the orphan checks in order; `None` means the entry is an orphan.
    pub fn rejection(
        &self,
        entry: &ScanEntry<'_>,
        table: &RuleTable,
        containers: &ContainerIndex,
    ) -> Option<OrphanRejection> {
        let path = entry.path();
        if self.is_user_excluded(path) {
            return Some(OrphanRejection::UserExcluded);
        }
        let raw_name = entry.entry.file_name().to_string_lossy();
        if is_uuid_name(raw_name.trim()) {
            return Some(OrphanRejection::ContainerUuid);
        }
        if entry.name.is_empty() || table.is_orphan_skipped(&entry.name) {
            return Some(OrphanRejection::Skipped);
        }
        if !entry.is_supported_type() {
            return Some(OrphanRejection::UnsupportedType);
        }
        if self.owns(&entry.name, path, containers) {
            return Some(OrphanRejection::InstalledApp);
        }
        if self.claims(&entry.name, path) {
            return Some(OrphanRejection::ClaimedByRule);
        }
        None
    }
}

struct OrphanPass {
    installed: InstalledSet,
    table: Arc<tokio::sync::OwnedRwLockReadGuard<RuleTable>>,
    containers: ContainerIndex,
    cancel: ScanCancel,
}

fn scan_orphan_root(root: &SearchRoot, pass: &OrphanPass, sink: &mpsc::Sender<Candidate>) -> usize {
    if pass.cancel.is_cancelled() {
        return 0;
    }
    let mut survivors = 0usize;
    let mut receiver_gone = false;
    walk_root(root, Some(&pass.cancel), |entry| {
        if receiver_gone {
            return Verdict::Reject;
        }
        if pass
            .installed
            .rejection(entry, &pass.table, &pass.containers)
            .is_some()
        {
            return Verdict::Reject;
        }
        let candidate = Candidate::new(entry.path(), entry.is_dir());
        if sink.blocking_send(candidate).is_err() {
            receiver_gone = true;
            return Verdict::Reject;
        }
        survivors += 1;
        Verdict::Accept
    });
    survivors
}

/// Owns the survivor set; the only place orphan results are accumulated.
async fn aggregate_orphans(
    mut receiver: mpsc::Receiver<Candidate>,
    mut mode: OrphanMode,
) -> Vec<Candidate> {
    let mut found = BTreeMap::new();
    let mut pending = Vec::new();
    while let Some(candidate) = receiver.recv().await {
        if found.contains_key(&candidate.path) {
            continue;
        }
        found.insert(candidate.path.clone(), candidate.clone());
        if let OrphanMode::Streaming {
            batch_size,
            on_batch,
        } = &mut mode
        {
            pending.push(candidate);
            if pending.len() >= (*batch_size).max(1) {
                on_batch(&pending);
                pending.clear();
            }
        }
    }
    if let OrphanMode::Streaming { on_batch, .. } = &mut mode
        && !pending.is_empty()
    {
        on_batch(&pending);
    }
    found.into_values().collect()
}

/// Entries under the residue roots that belong to none of `installed`.
///
/// Cancellation keeps everything found so far and marks the result.
pub async fn resolve_orphans(
    installed: &[AppDescriptor],
    exclusions: &[String],
    roots: &ResolverRoots,
    rules: &RuleStore,
    mode: OrphanMode,
    cancel: &ScanCancel,
) -> ResolutionResult {
    let table = Arc::new(rules.read().await);
    let containers = {
        let containers_root = roots.containers_root.clone();
        run_blocking("orphan_container_index", move || {
            Ok(ContainerIndex::build(containers_root.as_deref()))
        })
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(
                event = "orphan_container_index_failed",
                code = %error.code,
                detail = %error
            );
            ContainerIndex::default()
        })
    };
    let pass = Arc::new(OrphanPass {
        installed: InstalledSet::new(installed, &table, exclusions, roots.home.as_deref()),
        table,
        containers,
        cancel: cancel.clone(),
    });

    let (sender, receiver) = mpsc::channel(ORPHAN_CHANNEL_CAPACITY);
    let aggregator = tokio::spawn(aggregate_orphans(receiver, mode));

    let jobs = roots
        .residue_roots
        .iter()
        .cloned()
        .map(|root| (root, sender.clone()))
        .collect::<Vec<_>>();
    drop(sender);
    let root_count = jobs.len();
    let survivors = {
        let pass = Arc::clone(&pass);
        fan_out_blocking("orphan_root_scan", jobs, move |(root, sink)| {
            scan_orphan_root(&root, &pass, &sink)
        })
        .await
    };
    drop(pass);

    let found = aggregator.await.unwrap_or_else(|error| {
        tracing::warn!(event = "orphan_aggregator_failed", detail = %error);
        Vec::new()
    });
    let cancelled = cancel.is_cancelled();
    tracing::info!(
        event = "orphan_resolution_done",
        installed = installed.len(),
        roots = root_count,
        survivors = survivors.iter().sum::<usize>(),
        cancelled
    );
    finalize_orphans(found, cancelled)
}

#[cfg(test)]
#[path = "../tests/scan/reverse_tests.rs"]
mod reverse_tests;
