pub(super) fn normalize_level(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

pub(super) fn resolve_log_level(env_level: Option<&str>) -> String {
    if let Some(level) = env_level.and_then(normalize_level) {
        return level.to_string();
    }

    if cfg!(debug_assertions) {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}
