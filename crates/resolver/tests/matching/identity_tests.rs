use super::*;
use std::path::PathBuf;

fn widget() -> AppDescriptor {
    AppDescriptor::new("com.example.widget", "Widget", "/Applications/Widget Pro.app")
}

#[test]
fn identity_precomputes_normalized_tokens() {
    let identity = AppIdentity::from_descriptor(&widget());

    assert_eq!(identity.identifier, "comexamplewidget");
    assert_eq!(identity.short_form, "examplewidget");
    assert_eq!(identity.name, "widget");
    assert_eq!(identity.bundle_stem, "widgetpro");
    assert!(!identity.is_web_app);
}

#[test]
fn bundle_stem_strips_app_suffix_case_insensitively() {
    assert_eq!(bundle_stem(&PathBuf::from("/Applications/Foo.APP")), "Foo");
    assert_eq!(bundle_stem(&PathBuf::from("/opt/tool")), "tool");
    assert_eq!(bundle_stem(&PathBuf::from("/")), "");
}

#[test]
fn loose_match_uses_every_long_token() {
    let identity = AppIdentity::from_descriptor(&widget());

    assert!(identity.loosely_matches("comexamplewidgetplist"));
    assert!(identity.loosely_matches("examplewidgetsupport"));
    assert!(identity.loosely_matches("widgetcache"));
    assert!(identity.loosely_matches("mywidgetprostate"));
    assert!(!identity.loosely_matches("gadgetcache"));
}

#[test]
fn short_tokens_never_match_loosely() {
    let app = AppDescriptor::new("x.io", "Io", "/Applications/Io.app");
    let identity = AppIdentity::from_descriptor(&app);

    assert_eq!(identity.identifier, "xio");
    assert!(!identity.loosely_matches("radio"));
    assert!(!identity.loosely_matches("xiostate"));
}

#[test]
fn web_apps_match_only_on_full_identifier() {
    let mut app = widget();
    app.is_web_app = true;
    let identity = AppIdentity::from_descriptor(&app);

    assert!(identity.loosely_matches("comexamplewidgetcache"));
    assert!(!identity.loosely_matches("widgetcache"));
    assert!(!identity.loosely_matches("examplewidget"));

    let mut anonymous = AppDescriptor::new("", "Widget", "/Applications/Widget.app");
    anonymous.is_web_app = true;
    assert!(!AppIdentity::from_descriptor(&anonymous).loosely_matches("widget"));
}

#[test]
fn empty_identifier_degrades_to_name_matching() {
    let app = AppDescriptor::new("", "Widget", "/Applications/Widget.app");
    let identity = AppIdentity::from_descriptor(&app);

    assert!(identity.identifier.is_empty());
    assert!(identity.loosely_matches("widgetcache"));
    assert_eq!(identity.ownership_tokens().collect::<Vec<_>>(), vec!["widget", "widget"]);
}

#[test]
fn ownership_ignores_short_names() {
    let app = AppDescriptor::new("company.thebrowser.Browser", "Arc", "/Applications/Arc.app");
    let identity = AppIdentity::from_descriptor(&app);

    assert_eq!(
        identity.ownership_tokens().collect::<Vec<_>>(),
        vec!["companythebrowserbrowser", "thebrowserbrowser"]
    );
}

#[test]
fn web_apps_own_only_their_identifier_and_entitlements() {
    let mut app = widget();
    app.is_web_app = true;
    app.entitlement_strings = vec!["group.com.example.shared".to_string()];
    let identity = AppIdentity::from_descriptor(&app);

    assert_eq!(
        identity.ownership_tokens().collect::<Vec<_>>(),
        vec!["comexamplewidget", "groupcomexampleshared"]
    );
}
