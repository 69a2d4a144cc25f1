use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("residue").chain(args.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn files_accepts_target_and_flags() {
    let cli = parse(&["files", "com.example.Editor", "--json", "--sizes"]);
    let Commands::Files(args) = cli.command else {
        panic!("expected files command");
    };
    assert_eq!(args.target, "com.example.Editor");
    assert!(args.json);
    assert!(args.sizes);
    assert!(!cli.verbose);
}

#[test]
fn orphans_defaults_to_streaming_progress() {
    let cli = parse(&["--verbose", "orphans", "--apps-dir", "/opt/apps"]);
    let Commands::Orphans(args) = cli.command else {
        panic!("expected orphans command");
    };
    assert_eq!(args.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(args.apps_dirs, vec![PathBuf::from("/opt/apps")]);
    assert!(cli.verbose);
}

#[test]
fn conditions_add_collects_repeated_words() {
    let cli = parse(&[
        "conditions",
        "add",
        "com.example.editor",
        "--include",
        "editor",
        "--include",
        "edt",
        "--exclude-force",
        "~/.editor",
    ]);
    let Commands::Conditions(ConditionCommand::Add(args)) = cli.command else {
        panic!("expected conditions add");
    };
    assert_eq!(args.key, "com.example.editor");
    assert_eq!(args.include, vec!["editor".to_string(), "edt".to_string()]);
    assert!(args.exclude.is_empty());
    assert_eq!(args.exclude_force, vec![PathBuf::from("~/.editor")]);
}

#[test]
fn exclusions_remove_requires_path() {
    let missing = Cli::try_parse_from(["residue", "exclusions", "remove"]);
    assert!(missing.is_err());

    let cli = parse(&["exclusions", "remove", "~/Library/Caches/keep"]);
    assert!(matches!(
        cli.command,
        Commands::Exclusions(ExclusionCommand::Remove { ref path }) if path == "~/Library/Caches/keep"
    ));
}
