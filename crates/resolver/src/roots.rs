use protocol::models::SearchRoot;
use std::path::{Path, PathBuf};

const USER_SEARCH_DIRS: &[&str] = &[
    "Library",
    "Library/Application Scripts",
    "Library/Application Support",
    "Library/Application Support/CrashReporter",
    "Library/Autosave Information",
    "Library/Caches",
    "Library/Containers",
    "Library/Cookies",
    "Library/Group Containers",
    "Library/HTTPStorages",
    "Library/Internet Plug-Ins",
    "Library/LaunchAgents",
    "Library/Logs",
    "Library/Logs/DiagnosticReports",
    "Library/Preferences",
    "Library/Preferences/ByHost",
    "Library/Saved Application State",
    "Library/WebKit",
    "Library/Application Support/com.apple.sharedfilelist/com.apple.LSSharedFileList.ApplicationRecentDocuments",
];

const SYSTEM_SEARCH_DIRS: &[&str] = &[
    "/Library",
    "/Library/Application Support",
    "/Library/Caches",
    "/Library/Extensions",
    "/Library/Internet Plug-Ins",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Library/Logs",
    "/Library/Logs/DiagnosticReports",
    "/Library/Preferences",
    "/Library/PrivilegedHelperTools",
    "/private/var/db/receipts",
    "/Users/Shared",
];

const USER_RESIDUE_DIRS: &[&str] = &[
    "Library/Application Scripts",
    "Library/Application Support",
    "Library/Caches",
    "Library/Containers",
    "Library/Group Containers",
    "Library/HTTPStorages",
    "Library/LaunchAgents",
    "Library/Logs",
    "Library/Preferences",
    "Library/Saved Application State",
    "Library/WebKit",
];

const SYSTEM_RESIDUE_DIRS: &[&str] = &[
    "/Library/Application Support",
    "/Library/Caches",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Library/Logs",
    "/Library/PrivilegedHelperTools",
];

/// Directory layout one resolver instance scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverRoots {
    pub home: Option<PathBuf>,
    pub search_roots: Vec<SearchRoot>,
    pub residue_roots: Vec<SearchRoot>,
    /// Parent of per-app sandbox containers (`~/Library/Containers`).
    pub containers_root: Option<PathBuf>,
    /// Parent of App Group containers (`~/Library/Group Containers`).
    pub group_containers_root: Option<PathBuf>,
}

impl ResolverRoots {
    /// Built-in macOS layout for a user whose home directory is `home`.
    pub fn for_home(home: Option<&Path>) -> Self {
        let user = |dirs: &[&str]| -> Vec<SearchRoot> {
            home.map(|home| {
                dirs.iter()
                    .map(|dir| SearchRoot::shallow(home.join(dir)))
                    .collect()
            })
            .unwrap_or_default()
        };
        let system = |dirs: &[&str]| dirs.iter().map(SearchRoot::shallow).collect::<Vec<_>>();

        let mut search_roots = user(USER_SEARCH_DIRS);
        search_roots.extend(system(SYSTEM_SEARCH_DIRS));
        let mut residue_roots = user(USER_RESIDUE_DIRS);
        residue_roots.extend(system(SYSTEM_RESIDUE_DIRS));

        Self {
            home: home.map(Path::to_path_buf),
            search_roots,
            residue_roots,
            containers_root: home.map(|home| home.join("Library/Containers")),
            group_containers_root: home.map(|home| home.join("Library/Group Containers")),
        }
    }

    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::for_home(home.as_deref())
    }

    /// Replaces the default lists with configured ones; empty lists keep the defaults.
    pub fn with_overrides(mut self, search_roots: &[SearchRoot], residue_roots: &[SearchRoot]) -> Self {
        let home = self.home.clone();
        let expand = |roots: &[SearchRoot]| -> Vec<SearchRoot> {
            roots
                .iter()
                .map(|root| SearchRoot {
                    path: crate::rules::expand_home(&root.path, home.as_deref()),
                    max_depth: root.max_depth.max(1),
                })
                .collect()
        };
        if !search_roots.is_empty() {
            self.search_roots = expand(search_roots);
        }
        if !residue_roots.is_empty() {
            self.residue_roots = expand(residue_roots);
        }
        self
    }
}

#[cfg(test)]
#[path = "../tests/scan/roots_tests.rs"]
mod roots_tests;
