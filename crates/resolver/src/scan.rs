use crate::normalize::normalize;
use kernel::ScanCancel;
use protocol::models::SearchRoot;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Outcome of classifying one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Entry is a result; its subtree is not visited.
    Accept,
    /// Entry and its subtree are ignored.
    Reject,
    /// Entry is not a result; deeper roots may still descend into it.
    Pass,
}

/// One entry handed to a classifier: the walkdir entry plus its normalized name.
pub struct ScanEntry<'a> {
    pub entry: &'a DirEntry,
    pub name: String,
}

impl ScanEntry<'_> {
    pub fn path(&self) -> &Path {
        self.entry.path()
    }

    pub fn is_dir(&self) -> bool {
        self.entry.file_type().is_dir()
    }

    /// Regular files, directories and symlinks; sockets, pipes and devices are not.
    pub fn is_supported_type(&self) -> bool {
        let file_type = self.entry.file_type();
        file_type.is_file() || file_type.is_dir() || file_type.is_symlink()
    }
}

/// Walks `root` sequentially to its `max_depth`, calling `classify` for each entry.
/// Returns `false` when the walk stopped early because of cancellation.
pub fn walk_root<F>(root: &SearchRoot, cancel: Option<&ScanCancel>, mut classify: F) -> bool
where
    F: FnMut(&ScanEntry<'_>) -> Verdict,
{
    if !root.path.is_dir() {
        tracing::debug!(event = "resolver_root_missing", path = %root.path.display());
        return true;
    }

    let mut walker = WalkDir::new(&root.path)
        .min_depth(1)
        .max_depth(root.max_depth.max(1))
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(next) = walker.next() {
        if cancel.is_some_and(ScanCancel::is_cancelled) {
            return false;
        }
        let entry = match next {
            Ok(entry) => entry,
            Err(error) => {
                tracing::debug!(
                    event = "resolver_entry_unreadable",
                    root = %root.path.display(),
                    detail = %error
                );
                continue;
            }
        };
        let scan_entry = ScanEntry {
            name: normalize(&entry.file_name().to_string_lossy()),
            entry: &entry,
        };
        let verdict = classify(&scan_entry);
        if verdict != Verdict::Pass && entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
    }
    true
}

#[cfg(test)]
#[path = "../tests/scan/scan_tests.rs"]
mod scan_tests;
