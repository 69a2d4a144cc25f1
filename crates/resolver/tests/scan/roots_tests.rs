use super::*;

#[test]
fn home_layout_includes_user_and_system_roots() {
    let home = PathBuf::from("/Users/tester");
    let roots = ResolverRoots::for_home(Some(&home));

    assert!(roots
        .search_roots
        .contains(&SearchRoot::shallow("/Users/tester/Library/Preferences")));
    assert!(roots
        .search_roots
        .contains(&SearchRoot::shallow("/Library/LaunchDaemons")));
    assert!(roots
        .residue_roots
        .contains(&SearchRoot::shallow("/Users/tester/Library/Caches")));
    assert_eq!(
        roots.containers_root,
        Some(PathBuf::from("/Users/tester/Library/Containers"))
    );
}

#[test]
fn missing_home_keeps_system_roots_only() {
    let roots = ResolverRoots::for_home(None);

    assert!(roots.containers_root.is_none());
    assert!(roots
        .search_roots
        .iter()
        .all(|root| root.path.starts_with("/Library")
            || root.path.starts_with("/private")
            || root.path.starts_with("/Users/Shared")));
}

#[test]
fn overrides_expand_home_and_keep_defaults_when_empty() {
    let home = PathBuf::from("/Users/tester");
    let defaults = ResolverRoots::for_home(Some(&home));
    let roots = defaults.clone().with_overrides(
        &[SearchRoot {
            path: PathBuf::from("~/Projects"),
            max_depth: 0,
        }],
        &[],
    );

    assert_eq!(
        roots.search_roots,
        vec![SearchRoot::shallow("/Users/tester/Projects")]
    );
    assert_eq!(roots.residue_roots, defaults.residue_roots);
}
