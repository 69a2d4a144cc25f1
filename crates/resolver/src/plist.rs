use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BINARY_MAGIC: &[u8] = b"bplist";

/// String-valued entries of a property list's top-level dictionary.
///
/// Non-string values are dropped; that is all the resolver and bundle reader need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlistStrings(BTreeMap<String, String>);

impl PlistStrings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reads an XML plist directly; binary plists go through `plutil` first.
pub fn read_plist_strings(path: &Path) -> Option<PlistStrings> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(
                event = "plist_read_failed",
                path = %path.display(),
                detail = %error
            );
            return None;
        }
    };
    let text = if bytes.starts_with(BINARY_MAGIC) {
        binary_plist_as_xml(path)?
    } else {
        String::from_utf8(bytes).ok()?
    };
    let parsed = parse_plist_strings(&text);
    if parsed.is_none() {
        tracing::debug!(event = "plist_parse_failed", path = %path.display());
    }
    parsed
}

#[cfg(target_os = "macos")]
fn binary_plist_as_xml(path: &Path) -> Option<String> {
    let output = std::process::Command::new("plutil")
        .args(["-convert", "xml1", "-o", "-"])
        .arg(path)
        .output();
    match output {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout).ok(),
        Ok(output) => {
            tracing::debug!(
                event = "plist_convert_failed",
                path = %path.display(),
                status = %output.status
            );
            None
        }
        Err(error) => {
            tracing::debug!(
                event = "plist_convert_failed",
                path = %path.display(),
                detail = %error
            );
            None
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn binary_plist_as_xml(path: &Path) -> Option<String> {
    tracing::debug!(event = "plist_binary_unsupported", path = %path.display());
    None
}

/// String entries of an XML plist; `None` when the text is not a plist.
pub fn parse_plist_strings(content: &str) -> Option<PlistStrings> {
    if !content.contains("<plist") && !content.contains("<dict") {
        return None;
    }
    Some(PlistStrings(xml_string_pairs(content)))
}

fn xml_string_pairs(content: &str) -> BTreeMap<String, String> {
    let Ok(regex) = Regex::new(r"<key>([^<]+)</key>\s*<string>([^<]*)</string>") else {
        return BTreeMap::new();
    };
    let mut values = BTreeMap::new();
    for captures in regex.captures_iter(content) {
        let (Some(key), Some(value)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        values
            .entry(unescape_xml(key.as_str().trim()))
            .or_insert_with(|| unescape_xml(value.as_str().trim()));
    }
    values
}

/// Strings of the `<array>` stored under `key` in an XML property list.
pub fn xml_array_values(content: &str, key: &str) -> Vec<String> {
    let pattern = format!(
        r"(?s)<key>{}</key>\s*<array>(.*?)</array>",
        regex::escape(key)
    );
    let Ok(regex) = Regex::new(pattern.as_str()) else {
        return Vec::new();
    };
    let Some(array_body) = regex
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
    else {
        return Vec::new();
    };
    let Ok(string_regex) = Regex::new(r"<string>([^<]+)</string>") else {
        return Vec::new();
    };
    string_regex
        .captures_iter(array_body)
        .filter_map(|captures| captures.get(1))
        .map(|value| unescape_xml(value.as_str().trim()))
        .filter(|value| !value.is_empty())
        .collect()
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "../tests/plist/plist_tests.rs"]
mod plist_tests;
