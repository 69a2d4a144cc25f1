use protocol::models::{Condition, SkipRule};
use std::path::PathBuf;

fn condition(
    key: &str,
    include: &[&str],
    exclude: &[&str],
    include_force: &[&str],
    exclude_force: &[&str],
) -> Condition {
    Condition {
        key: key.to_string(),
        include: include.iter().map(ToString::to_string).collect(),
        exclude: exclude.iter().map(ToString::to_string).collect(),
        include_force: include_force.iter().map(PathBuf::from).collect(),
        exclude_force: exclude_force.iter().map(PathBuf::from).collect(),
    }
}

fn skip(prefix: &str, allow: &[&str]) -> SkipRule {
    SkipRule {
        prefix: prefix.to_string(),
        allow: allow.iter().map(ToString::to_string).collect(),
    }
}

/// Vendor cases whose files do not textually follow the bundle identifier, or that
/// share a token with unrelated products.
pub(super) fn builtin_conditions() -> Vec<Condition> {
    vec![
        condition(
            "comgooglechrome",
            &["google", "chrome"],
            &["iterm", "chromefeaturestate", "monosnap", "googledrive", "googleearth"],
            &[],
            &[],
        ),
        condition(
            "comgooglechromecanary",
            &["chromecanary"],
            &["iterm"],
            &[],
            &["~/Library/Application Support/Google/Chrome"],
        ),
        condition(
            "commicrosoftvscode",
            &["vscode", "visualstudiocode"],
            &["vscodium", "vscodeinsiders"],
            &["~/.vscode"],
            &[],
        ),
        condition(
            "comvscodium",
            &["vscodium"],
            &[],
            &["~/.vscode-oss"],
            &[],
        ),
        condition(
            "comdockerdocker",
            &["docker"],
            &["dockerless"],
            &["~/.docker"],
            &[],
        ),
        condition(
            "orgmozillafirefox",
            &["firefox", "mozilla"],
            &["thunderbird"],
            &[],
            &[],
        ),
        condition(
            "orgmozillathunderbird",
            &["thunderbird"],
            &["firefox"],
            &[],
            &[],
        ),
        condition(
            "comjetbrains",
            &["jetbrains"],
            &["toolbox"],
            &[],
            &[],
        ),
        condition(
            "comspotifyclient",
            &["spotify"],
            &["spotifywebhelper"],
            &[],
            &[],
        ),
        condition(
            "comtinyspeckslackmacgap",
            &["slack"],
            &[],
            &[],
            &[],
        ),
    ]
}

/// Apple owns most `com.apple.*` names; only its separately installed products keep
/// their files in scope.
pub(super) fn builtin_skip_rules() -> Vec<SkipRule> {
    vec![
        skip(
            "comapple",
            &[
                "comappledt",
                "comapplexcode",
                "comapplefinalcut",
                "comapplelogic10",
                "comapplemainstage",
                "comapplemotionapp",
                "comapplecompressor",
                "comappleiwork",
                "comapplepages",
                "comapplekeynote",
                "comapplenumbers",
                "comappleimovie",
                "comapplegarageband10",
                "comappleconfigurator",
                "comapplesafaritechnologypreview",
                "comappletestflight",
            ],
        ),
        skip("dsstore", &[]),
        skip("localized", &[]),
        skip("temporaryitems", &[]),
    ]
}

pub(super) fn builtin_orphan_skip_rules() -> Vec<SkipRule> {
    vec![
        skip("comapple", &[]),
        skip("apple", &[]),
        skip("dsstore", &[]),
        skip("localized", &[]),
        skip("temporaryitems", &[]),
        skip("cloudkit", &[]),
        skip("icloud", &[]),
        skip("mobiledocuments", &[]),
        skip("groupcomapple", &[]),
        skip("systemextensions", &[]),
        skip("crashreporter", &[]),
        skip("diagnosticreports", &[]),
        skip("metadata", &[]),
        skip("addressbook", &[]),
        skip("callhistory", &[]),
        skip("knowledge", &[]),
        skip("familysettings", &[]),
        skip("syncservices", &[]),
    ]
}
