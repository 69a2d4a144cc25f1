use crate::normalize::{is_uuid_name, normalize};
use crate::plist::read_plist_strings;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONTAINER_METADATA_FILE: &str = ".com.apple.containermanagerd.metadata.plist";
const METADATA_OWNER_KEY: &str = "MCMMetadataIdentifier";

/// Owner bundle identifier recorded in a sandbox container's metadata file.
pub fn container_owner(container: &Path) -> Option<String> {
    let strings = read_plist_strings(&container.join(CONTAINER_METADATA_FILE))?;
    strings
        .get(METADATA_OWNER_KEY)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn child_dirs(root: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(
                event = "container_root_unreadable",
                path = %root.display(),
                detail = %error
            );
            return Vec::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_dir()))
        .map(|entry| entry.path())
        .collect()
}

/// UUID-named containers under `containers_root` whose recorded owner is `identifier`.
/// A container whose metadata cannot be read is skipped on its own.
pub fn sandbox_containers_for(containers_root: &Path, identifier: &str) -> Vec<PathBuf> {
    let wanted = normalize(identifier);
    if wanted.is_empty() {
        return Vec::new();
    }
    child_dirs(containers_root)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|value| value.to_str())
                .is_some_and(is_uuid_name)
        })
        .filter(|path| {
            container_owner(path).is_some_and(|owner| normalize(&owner) == wanted)
        })
        .collect()
}

/// App Group container named after the bundle identifier, when present.
pub fn group_container_for(group_root: &Path, bundle_identifier: &str) -> Option<PathBuf> {
    let bundle_identifier = bundle_identifier.trim();
    if bundle_identifier.is_empty() || bundle_identifier.contains('/') {
        return None;
    }
    let path = group_root.join(bundle_identifier);
    path.is_dir().then_some(path)
}

/// Directory name to normalized owner identifier for every container under a root.
/// Built fresh for each orphan pass.
#[derive(Debug, Clone, Default)]
pub struct ContainerIndex {
    root: Option<PathBuf>,
    owners: HashMap<String, String>,
}

impl ContainerIndex {
    pub fn build(containers_root: Option<&Path>) -> Self {
        let Some(root) = containers_root else {
            return Self::default();
        };
        let owners = child_dirs(root)
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                let owner = normalize(&container_owner(&path)?);
                (!owner.is_empty()).then_some((name, owner))
            })
            .collect::<HashMap<_, _>>();
        tracing::debug!(
            event = "container_index_built",
            path = %root.display(),
            containers = owners.len()
        );
        Self {
            root: Some(root.to_path_buf()),
            owners,
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner of `path` when it sits directly under the indexed root.
    pub fn owner_of(&self, path: &Path) -> Option<&str> {
        let root = self.root.as_deref()?;
        if path.parent()? != root {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        self.owners.get(name).map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../tests/scan/container_tests.rs"]
mod container_tests;
