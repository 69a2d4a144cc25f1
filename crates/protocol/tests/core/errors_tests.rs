use super::*;
use anyhow::Context as _;
use std::io;

#[test]
fn app_error_passes_through_anyhow_unchanged() {
    let original = AppError::new("settings_write_failed", "could not write settings")
        .with_context("path", "settings.json");

    let restored = AppError::from(anyhow::Error::new(original.clone()));

    assert_eq!(restored, original);
    assert_eq!(restored.context_value("path"), Some("settings.json"));
}

#[test]
fn foreign_errors_become_unclassified_with_their_chain() {
    let error = Err::<(), io::Error>(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "permission denied",
    ))
    .context("reading /Library/Caches")
    .expect_err("should fail");

    let app_error = AppError::from(error);

    assert_eq!(app_error.code, UNCLASSIFIED_CODE);
    assert_eq!(
        app_error.causes,
        vec![
            "reading /Library/Caches".to_string(),
            "permission denied".to_string()
        ]
    );
}

#[test]
fn with_source_records_causes_after_existing_context() {
    let error = AppError::new("settings_read_failed", "could not read the settings file")
        .with_context("settingsPath", "/tmp/settings.json")
        .with_source(io::Error::new(io::ErrorKind::NotFound, "file missing"));

    assert_eq!(error.causes, vec!["file missing".to_string()]);
    assert_eq!(error.context.len(), 1);
    assert_eq!(error.to_string(), "settings_read_failed: could not read the settings file");
}

#[test]
fn result_ext_replaces_code_or_appends_context() {
    let error = Err::<(), io::Error>(io::Error::other("boom"))
        .with_code("scan_failed", "scan failed")
        .expect_err("should map error");
    assert_eq!(error.code, "scan_failed");
    assert_eq!(error.causes, vec!["boom".to_string()]);

    let error = Err::<(), io::Error>(io::Error::other("boom"))
        .with_ctx("root", "/Library/Caches")
        .expect_err("should map error");
    assert_eq!(error.code, UNCLASSIFIED_CODE);
    assert_eq!(error.context_value("root"), Some("/Library/Caches"));
    assert_eq!(error.context_value("missing"), None);
}

#[test]
fn blank_and_repeated_causes_are_dropped() {
    let chain: Vec<Box<dyn StdError>> = vec![
        Box::new(io::Error::other("disk full")),
        Box::new(io::Error::other("disk full")),
        Box::new(io::Error::other("  ")),
    ];
    let texts = cause_texts(chain.iter().map(|error| &**error));
    assert_eq!(texts, vec!["disk full".to_string()]);
}

#[test]
fn release_causes_are_single_line_and_bounded() {
    assert_eq!(single_line_cause("cannot open\n  settings.json"), "cannot open settings.json");

    let long = "x".repeat(RELEASE_CAUSE_MAX_CHARS + 10);
    let cut = single_line_cause(&long);
    assert_eq!(cut.chars().count(), RELEASE_CAUSE_MAX_CHARS + 3);
    assert!(cut.ends_with("..."));
}
