use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Keeps ASCII alphanumerics and lowercases them. Total and idempotent; every
/// identifier, name, entry basename, rule key and keyword is compared in this form.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Identity of one installed application as read from its bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppDescriptor {
    pub bundle_identifier: String,
    pub display_name: String,
    pub bundle_path: PathBuf,
    pub is_web_app: bool,
    pub entitlement_strings: Vec<String>,
}

impl AppDescriptor {
    pub fn new(
        bundle_identifier: impl Into<String>,
        display_name: impl Into<String>,
        bundle_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bundle_identifier: bundle_identifier.into(),
            display_name: display_name.into(),
            bundle_path: bundle_path.into(),
            is_web_app: false,
            entitlement_strings: Vec::new(),
        }
    }
}

/// Per-bundle ownership rule. `key` is a normalized bundle identifier fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    pub key: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_force: Vec<PathBuf>,
    pub exclude_force: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkipRule {
    pub prefix: String,
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRoot {
    pub path: PathBuf,
    #[serde(default = "default_root_depth")]
    pub max_depth: usize,
}

fn default_root_depth() -> usize {
    1
}

impl SearchRoot {
    pub fn shallow(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_depth: 1,
        }
    }

    pub fn deep(path: impl Into<PathBuf>, max_depth: usize) -> Self {
        Self {
            path: path.into(),
            max_depth: max_depth.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconHandle(pub PathBuf);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSize {
    /// Allocated bytes on disk.
    pub real_bytes: u64,
    /// Apparent length.
    pub logical_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub path: PathBuf,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<DiskSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconHandle>,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            is_dir,
            size: None,
            icon: None,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path, path.is_dir())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub candidates: Vec<Candidate>,
    pub total_real_bytes: u64,
    pub total_logical_bytes: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl ResolutionResult {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.candidates.iter().map(|candidate| candidate.path.as_path())
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}
