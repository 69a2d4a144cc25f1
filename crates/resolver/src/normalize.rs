pub use protocol::models::normalize;

/// Loose "contains" checks ignore tokens shorter than this.
pub const MIN_LOOSE_TOKEN_LEN: usize = 4;

const UUID_TEXT_LEN: usize = 36;

/// Last two dot components of a bundle identifier, joined and normalized.
pub fn short_form(identifier: &str) -> String {
    let parts = identifier
        .split('.')
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>();
    let tail = &parts[parts.len().saturating_sub(2)..];
    normalize(&tail.concat())
}

pub fn is_loose_token(token: &str) -> bool {
    token.len() >= MIN_LOOSE_TOKEN_LEN
}

/// Hyphenated 8-4-4-4-12 hex names, the shape macOS uses for container folders.
pub fn is_uuid_name(name: &str) -> bool {
    name.len() == UUID_TEXT_LEN && uuid::Uuid::parse_str(name).is_ok()
}

#[cfg(test)]
#[path = "../tests/matching/normalize_tests.rs"]
mod normalize_tests;
