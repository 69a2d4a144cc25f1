use residue_protocol::models::AppDescriptor;
use residue_protocol::{AppError, AppResult};
use residue_resolver::identity::bundle_stem;
use residue_resolver::plist::{PlistStrings, read_plist_strings};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const APPLICATION_DIRS: &[&str] = &["/Applications", "/Applications/Utilities", "/System/Applications"];
const APP_SCAN_DEPTH: usize = 3;
const WEB_APP_SHORTCUT_KEY: &str = "CrAppModeShortcutID";
const SAFARI_WEB_APP_MARKER: &str = "com.apple.Safari.WebApp";
#[cfg(target_os = "macos")]
const APP_GROUPS_ENTITLEMENT: &str = "com.apple.security.application-groups";

pub fn is_app_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case("app"))
}

/// Builds a descriptor from `Contents/Info.plist`. Bundles without a readable plist
/// still resolve by their file name.
pub fn read_app_descriptor(bundle_path: &Path) -> AppResult<AppDescriptor> {
    if !bundle_path.is_dir() {
        return Err(AppError::new("app_bundle_not_found", "application bundle not found")
            .with_context("path", bundle_path.display().to_string()));
    }
    let info = read_plist_strings(&bundle_path.join("Contents").join("Info.plist"))
        .unwrap_or_default();
    let mut descriptor = descriptor_from_info(bundle_path, &info);
    descriptor.entitlement_strings = read_entitlement_groups(bundle_path);
    Ok(descriptor)
}

pub fn descriptor_from_info(bundle_path: &Path, info: &PlistStrings) -> AppDescriptor {
    let bundle_identifier = info
        .get("CFBundleIdentifier")
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let display_name = ["CFBundleDisplayName", "CFBundleName"]
        .iter()
        .filter_map(|key| info.get(key))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| bundle_stem(bundle_path));
    let is_web_app = info.contains_key(WEB_APP_SHORTCUT_KEY)
        || bundle_identifier.contains(SAFARI_WEB_APP_MARKER);

    AppDescriptor {
        bundle_identifier,
        display_name,
        bundle_path: bundle_path.to_path_buf(),
        is_web_app,
        entitlement_strings: Vec::new(),
    }
}

#[cfg(target_os = "macos")]
fn read_entitlement_groups(bundle_path: &Path) -> Vec<String> {
    let output = std::process::Command::new("codesign")
        .args(["-d", "--entitlements", ":-"])
        .arg(bundle_path)
        .output();
    let output = match output {
        Ok(output) => output,
        Err(error) => {
            tracing::debug!(
                event = "codesign_entitlements_failed",
                path = %bundle_path.display(),
                detail = %error
            );
            return Vec::new();
        }
    };
    let text = String::from_utf8_lossy(&output.stdout);
    residue_resolver::plist::xml_array_values(&text, APP_GROUPS_ENTITLEMENT)
}

#[cfg(not(target_os = "macos"))]
fn read_entitlement_groups(_bundle_path: &Path) -> Vec<String> {
    Vec::new()
}

/// Application directories scanned for installed bundles.
pub fn application_dirs(home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = APPLICATION_DIRS.iter().map(PathBuf::from).collect::<Vec<_>>();
    if let Some(home) = home {
        dirs.push(home.join("Applications"));
    }
    dirs
}

/// Every `.app` bundle under `dirs`. Bundles are not descended into.
pub fn find_app_bundles(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut bundles = Vec::new();
    for dir in dirs.iter().filter(|dir| dir.is_dir()) {
        let mut walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(APP_SCAN_DEPTH)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        while let Some(next) = walker.next() {
            let Ok(entry) = next else {
                continue;
            };
            if !entry.file_type().is_dir() || !is_app_bundle(entry.path()) {
                continue;
            }
            walker.skip_current_dir();
            if seen.insert(entry.path().to_path_buf()) {
                bundles.push(entry.into_path());
            }
        }
    }
    bundles
}

/// Descriptors for every readable bundle under `dirs`.
pub fn installed_apps(dirs: &[PathBuf]) -> Vec<AppDescriptor> {
    find_app_bundles(dirs)
        .iter()
        .filter_map(|path| match read_app_descriptor(path) {
            Ok(descriptor) => Some(descriptor),
            Err(error) => {
                tracing::debug!(
                    event = "installed_app_unreadable",
                    path = %path.display(),
                    code = %error.code
                );
                None
            }
        })
        .collect()
}

/// `target` as an existing `.app` directory, if it is one.
pub fn bundle_target(target: &str) -> Option<PathBuf> {
    let path = Path::new(target.trim());
    (is_app_bundle(path) && path.is_dir()).then(|| path.to_path_buf())
}

/// Finds `target` among `installed` by bundle identifier, display name or bundle
/// file name, ignoring case.
pub fn find_app(target: &str, installed: &[AppDescriptor]) -> AppResult<AppDescriptor> {
    let target = target.trim();
    let wanted = target.to_lowercase();
    let wanted_bundle = format!("{wanted}.app");
    installed
        .iter()
        .find(|app| {
            app.bundle_identifier.to_lowercase() == wanted
                || app.display_name.to_lowercase() == wanted
                || app
                    .bundle_path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().to_lowercase() == wanted_bundle)
        })
        .cloned()
        .ok_or_else(|| {
            AppError::new("app_not_found", "no installed application matches")
                .with_context("target", target)
        })
}

#[cfg(test)]
#[path = "../tests/cli/bundle_tests.rs"]
mod bundle_tests;
