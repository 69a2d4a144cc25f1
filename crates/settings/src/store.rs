use crate::{AppError, AppResult};
use protocol::models::{Condition, SearchRoot, SkipRule, normalize};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const SETTINGS_DIR_NAME: &str = ".residue";
const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_PATH_ENV: &str = "RESIDUE_SETTINGS_PATH";
pub const MAX_ROOT_DEPTH: usize = 8;

/// User-editable overlay on top of the built-in roots and rule tables.
///
/// Empty root lists mean "use the built-in defaults".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverSettings {
    pub search_roots: Vec<SearchRoot>,
    pub residue_roots: Vec<SearchRoot>,
    pub orphan_exclusions: Vec<String>,
    pub conditions: Vec<Condition>,
    pub disabled_conditions: Vec<String>,
    pub skip_rules: Vec<SkipRule>,
    pub orphan_skip_rules: Vec<SkipRule>,
}

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn default_location() -> AppResult<Self> {
        if let Some(value) = env::var_os(SETTINGS_PATH_ENV)
            && !value.is_empty()
        {
            return Ok(Self::at(PathBuf::from(value)));
        }
        let home = home_dir().ok_or_else(|| {
            AppError::new(
                "settings_home_dir_unavailable",
                "cannot locate the home directory to read settings",
            )
        })?;
        Ok(Self::at(home.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn load(&self) -> AppResult<ResolverSettings> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        load_or_init_unlocked(&self.path)
    }

    /// Read-modify-write under the store lock; the result is normalized before it
    /// is persisted and returned.
    pub fn update<F>(&self, apply: F) -> AppResult<ResolverSettings>
    where
        F: FnOnce(&mut ResolverSettings),
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut settings = load_or_init_unlocked(&self.path)?;
        apply(&mut settings);
        let settings = normalize_settings(settings);
        write_settings_file(&self.path, &settings)?;
        Ok(settings)
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn normalize_roots(roots: Vec<SearchRoot>) -> Vec<SearchRoot> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|root| !root.path.as_os_str().is_empty())
        .map(|root| SearchRoot {
            max_depth: root.max_depth.clamp(1, MAX_ROOT_DEPTH),
            path: root.path,
        })
        .filter(|root| seen.insert(root.path.clone()))
        .collect()
}

fn normalize_words(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn normalize_condition(mut condition: Condition) -> Option<Condition> {
    condition.key = normalize(&condition.key);
    if condition.key.is_empty() {
        return None;
    }
    condition.include = normalize_words(condition.include);
    condition.exclude = normalize_words(condition.exclude);
    condition
        .include_force
        .retain(|path| !path.as_os_str().is_empty());
    condition
        .exclude_force
        .retain(|path| !path.as_os_str().is_empty());
    Some(condition)
}

fn normalize_skip_rules(rules: Vec<SkipRule>) -> Vec<SkipRule> {
    rules
        .into_iter()
        .filter_map(|mut rule| {
            rule.prefix = normalize(&rule.prefix);
            if rule.prefix.is_empty() {
                return None;
            }
            rule.allow = normalize_words(rule.allow.iter().map(|value| normalize(value)).collect());
            Some(rule)
        })
        .collect()
}

pub fn normalize_settings(settings: ResolverSettings) -> ResolverSettings {
    let mut seen_keys = HashSet::new();
    let conditions = settings
        .conditions
        .into_iter()
        .filter_map(normalize_condition)
        .rev()
        .filter(|condition| seen_keys.insert(condition.key.clone()))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    ResolverSettings {
        search_roots: normalize_roots(settings.search_roots),
        residue_roots: normalize_roots(settings.residue_roots),
        orphan_exclusions: normalize_words(settings.orphan_exclusions),
        conditions,
        disabled_conditions: normalize_words(
            settings
                .disabled_conditions
                .iter()
                .map(|key| normalize(key))
                .collect(),
        ),
        skip_rules: normalize_skip_rules(settings.skip_rules),
        orphan_skip_rules: normalize_skip_rules(settings.orphan_skip_rules),
    }
}

fn write_settings_file(path: &Path, settings: &ResolverSettings) -> AppResult<()> {
    let parent = path.parent().ok_or_else(|| {
        AppError::new(
            "settings_path_invalid",
            "settings path has no parent directory",
        )
    })?;

    fs::create_dir_all(parent).map_err(|error| {
        AppError::new("settings_dir_create_failed", "could not create the settings directory")
            .with_source(error)
            .with_context("path", parent.to_string_lossy().to_string())
    })?;

    let serialized = serde_json::to_string_pretty(settings).map_err(|error| {
        AppError::new("settings_serialize_failed", "could not serialize settings").with_source(error)
    })?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, serialized).map_err(|error| {
        AppError::new("settings_temp_write_failed", "could not write the temporary settings file")
            .with_source(error)
            .with_context("path", temp_path.to_string_lossy().to_string())
    })?;

    fs::rename(&temp_path, path).map_err(|error| {
        let _ = fs::remove_file(&temp_path);
        AppError::new("settings_write_failed", "could not replace the settings file")
            .with_source(error)
            .with_context("path", path.to_string_lossy().to_string())
    })
}

fn backup_corrupted_settings_file(path: &Path, content: &str) -> Option<PathBuf> {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    let file_name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or(SETTINGS_FILE_NAME);
    let backup_path = path.with_file_name(format!("{file_name}.bak.{suffix}"));

    match fs::write(&backup_path, content) {
        Ok(_) => Some(backup_path),
        Err(error) => {
            tracing::warn!(
                event = "settings_backup_failed",
                detail = %error,
                path = %path.to_string_lossy(),
                backup_path = %backup_path.to_string_lossy()
            );
            None
        }
    }
}

fn load_or_init_unlocked(path: &Path) -> AppResult<ResolverSettings> {
    let content = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            let settings = ResolverSettings::default();
            write_settings_file(path, &settings)?;
            return Ok(settings);
        }
        Err(error) => {
            return Err(
                AppError::new("settings_read_failed", "could not read the settings file")
                    .with_source(error)
                    .with_context("path", path.to_string_lossy().to_string()),
            );
        }
    };

    let settings = match serde_json::from_str::<ResolverSettings>(&content) {
        Ok(value) => normalize_settings(value),
        Err(error) => {
            let backup_path = backup_corrupted_settings_file(path, &content);
            tracing::warn!(
                event = "settings_parse_failed",
                detail = %error,
                path = %path.to_string_lossy(),
                backup_path = ?backup_path
            );
            let settings = ResolverSettings::default();
            write_settings_file(path, &settings)?;
            return Ok(settings);
        }
    };

    let normalized_content = serde_json::to_string_pretty(&settings).map_err(|error| {
        AppError::new("settings_serialize_failed", "could not serialize settings").with_source(error)
    })?;
    if normalized_content != content {
        write_settings_file(path, &settings)?;
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "../tests/settings/store_tests.rs"]
mod store_tests;
