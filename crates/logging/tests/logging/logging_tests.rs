use super::*;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_nanos())
        .unwrap_or(0);
    let path = std::env::temp_dir().join(format!("residue-{prefix}-{unique}"));
    fs::create_dir_all(path.as_path()).expect("temp dir should be created");
    path
}

#[test]
fn resolve_log_level_accepts_known_levels_case_insensitively() {
    assert_eq!(config::resolve_log_level(Some(" WARN ")), "warn");
    assert_eq!(config::resolve_log_level(Some("trace")), "trace");
}

#[test]
fn resolve_log_level_falls_back_for_unknown_values() {
    let fallback = if cfg!(debug_assertions) { "debug" } else { "info" };
    assert_eq!(config::resolve_log_level(Some("verbose")), fallback);
    assert_eq!(config::resolve_log_level(None), fallback);
}

#[test]
fn cleanup_removes_only_files_older_than_retention() {
    let root = make_temp_dir("log-cleanup");
    fs::write(root.join("residue.2020-01-01.log"), "{}").expect("log file should be written");
    fs::create_dir_all(root.join("nested")).expect("nested dir should be created");

    let kept = ingest::cleanup_expired_logs_with_duration(
        root.as_path(),
        Duration::from_secs(3600),
        SystemTime::now(),
    )
    .expect("cleanup should succeed");
    assert_eq!(kept, 0);

    let removed = ingest::cleanup_expired_logs_with_duration(
        root.as_path(),
        Duration::from_secs(60),
        SystemTime::now() + Duration::from_secs(3600),
    )
    .expect("cleanup should succeed");
    assert_eq!(removed, 1);
    assert!(root.join("nested").is_dir());

    fs::remove_dir_all(root).expect("temp dir should be removed");
}

#[test]
fn cleanup_ignores_missing_directory() {
    let missing = std::env::temp_dir().join("residue-log-cleanup-missing-dir");
    assert!(cleanup_expired_logs(missing.as_path(), 7).is_ok());
}

#[test]
fn sanitize_path_folds_home_prefix() {
    let home = Path::new("/Users/tester");
    assert_eq!(
        ingest::sanitize_path_with_home(Path::new("/Users/tester/Library/Caches"), Some(home)),
        "~/Library/Caches"
    );
    assert_eq!(
        ingest::sanitize_path_with_home(Path::new("/Users/tester"), Some(home)),
        "~"
    );
    assert_eq!(
        ingest::sanitize_path_with_home(Path::new("/Library/Caches"), Some(home)),
        "/Library/Caches"
    );
}
