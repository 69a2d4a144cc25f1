use crate::normalize::{is_loose_token, normalize, short_form};
use protocol::models::AppDescriptor;
use std::path::Path;

/// Normalized tokens of one app, computed once per resolution call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppIdentity {
    pub bundle_identifier: String,
    pub identifier: String,
    pub short_form: String,
    pub name: String,
    pub bundle_stem: String,
    pub is_web_app: bool,
    pub entitlements: Vec<String>,
}

impl AppIdentity {
    pub fn from_descriptor(app: &AppDescriptor) -> Self {
        Self {
            bundle_identifier: app.bundle_identifier.trim().to_string(),
            identifier: normalize(&app.bundle_identifier),
            short_form: short_form(&app.bundle_identifier),
            name: normalize(&app.display_name),
            bundle_stem: normalize(&bundle_stem(&app.bundle_path)),
            is_web_app: app.is_web_app,
            entitlements: app
                .entitlement_strings
                .iter()
                .map(|value| normalize(value))
                .filter(|value| !value.is_empty())
                .collect(),
        }
    }

    /// Fallback heuristic for entries no condition decided.
    pub fn loosely_matches(&self, entry: &str) -> bool {
        if self.is_web_app {
            return !self.identifier.is_empty() && entry.contains(self.identifier.as_str());
        }
        [
            self.identifier.as_str(),
            self.short_form.as_str(),
            self.name.as_str(),
            self.bundle_stem.as_str(),
        ]
        .into_iter()
        .any(|token| is_loose_token(token) && entry.contains(token))
    }

    /// Tokens an orphan candidate must not contain for this installed app. Name-like
    /// tokens follow the same length floor as the loose forward match; web apps own
    /// only their full identifier.
    pub fn ownership_tokens(&self) -> impl Iterator<Item = &str> {
        let loose = if self.is_web_app {
            [""; 3]
        } else {
            [
                self.name.as_str(),
                self.short_form.as_str(),
                self.bundle_stem.as_str(),
            ]
        };
        std::iter::once(self.identifier.as_str())
            .filter(|token| !token.is_empty())
            .chain(loose.into_iter().filter(|token| is_loose_token(token)))
            .chain(
                self.entitlements
                    .iter()
                    .map(String::as_str)
                    .filter(|token| !token.is_empty()),
            )
    }
}

/// Last path component with a trailing `.app` removed.
pub fn bundle_stem(path: &Path) -> String {
    let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
        return String::new();
    };
    let lower = name.to_ascii_lowercase();
    match lower.strip_suffix(".app") {
        Some(_) => name[..name.len() - 4].to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
#[path = "../tests/matching/identity_tests.rs"]
mod identity_tests;
