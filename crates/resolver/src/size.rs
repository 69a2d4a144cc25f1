use crate::plist::read_plist_strings;
use protocol::models::{DiskSize, IconHandle};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Size and icon for one result path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMetrics {
    pub size: DiskSize,
    pub icon: Option<IconHandle>,
}

/// Side-effect-free lookup the assembler calls for each forward result.
pub trait SizeProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Option<PathMetrics>;
}

/// Walks the filesystem; symlinks are never followed or counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSizeProbe;

impl SizeProbe for FsSizeProbe {
    fn probe(&self, path: &Path) -> Option<PathMetrics> {
        let size = walk_disk_size(path)?;
        Some(PathMetrics {
            size,
            icon: bundle_icon(path),
        })
    }
}

#[cfg(unix)]
fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blocks().saturating_mul(512)
}

#[cfg(not(unix))]
fn allocated_bytes(meta: &fs::Metadata) -> u64 {
    meta.len()
}

fn add_file(total: &mut DiskSize, meta: &fs::Metadata) {
    total.logical_bytes = total.logical_bytes.saturating_add(meta.len());
    total.real_bytes = total.real_bytes.saturating_add(allocated_bytes(meta));
}

pub fn walk_disk_size(path: &Path) -> Option<DiskSize> {
    let root_meta = fs::symlink_metadata(path).ok()?;
    let mut total = DiskSize::default();
    if root_meta.file_type().is_symlink() {
        return Some(total);
    }
    if root_meta.is_file() {
        add_file(&mut total, &root_meta);
        return Some(total);
    }

    let mut queue = VecDeque::from([path.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::debug!(
                    event = "size_read_dir_failed",
                    path = %dir.display(),
                    detail = %error
                );
                continue;
            }
        };
        for entry in entries.filter_map(Result::ok) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                queue.push_back(entry.path());
                continue;
            }
            if file_type.is_file()
                && let Ok(meta) = entry.metadata()
            {
                add_file(&mut total, &meta);
            }
        }
    }
    Some(total)
}

fn is_app_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case("app"))
}

/// `Contents/Resources/<CFBundleIconFile>` of an `.app` bundle.
pub fn bundle_icon(path: &Path) -> Option<IconHandle> {
    if !is_app_bundle(path) {
        return None;
    }
    let contents = path.join("Contents");
    let info = read_plist_strings(&contents.join("Info.plist"))?;
    let name = info.get("CFBundleIconFile")?.trim();
    if name.is_empty() || name.contains('/') {
        return None;
    }
    let mut file = PathBuf::from(name);
    if file.extension().is_none() {
        file.set_extension("icns");
    }
    let icon = contents.join("Resources").join(file);
    icon.is_file().then_some(IconHandle(icon))
}

#[cfg(test)]
#[path = "../tests/assemble/size_tests.rs"]
mod size_tests;
