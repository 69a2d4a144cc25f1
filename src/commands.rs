use crate::bundle::{application_dirs, bundle_target, find_app, installed_apps, read_app_descriptor};
use crate::cli::{
    Commands, ConditionArgs, ConditionCommand, ExclusionCommand, FilesArgs, OrphansArgs,
};
use residue_kernel::{ScanCancel, run_blocking};
use residue_protocol::models::{AppDescriptor, Condition, ResolutionResult};
use residue_protocol::{AppError, AppResult, ResultExt};
use residue_resolver::{
    FsSizeProbe, OrphanMode, ResolverRoots, RuleOverlay, RuleStore, RuleTable, SizeProbe,
    normalize, resolve_app_files, resolve_orphans,
};
use residue_settings::{ResolverSettings, SettingsStore};
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

fn command_start(command: &str) -> Instant {
    tracing::info!(event = "command_start", command = command);
    Instant::now()
}

fn command_end_ok(command: &str, started_at: Instant) {
    tracing::info!(
        event = "command_end",
        command = command,
        ok = true,
        duration_ms = started_at.elapsed().as_millis() as u64
    );
}

fn command_end_error(command: &str, started_at: Instant, error: &AppError) {
    tracing::warn!(
        event = "command_end",
        command = command,
        ok = false,
        duration_ms = started_at.elapsed().as_millis() as u64,
        error_code = error.code.as_str(),
        error_message = error.message.as_str()
    );
}

async fn run_command<F>(command: &str, job: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let started_at = command_start(command);
    let result = job.await;
    match &result {
        Ok(()) => command_end_ok(command, started_at),
        Err(error) => command_end_error(command, started_at, error),
    }
    result
}

pub async fn dispatch(command: Commands, store: &SettingsStore) -> AppResult<()> {
    match command {
        Commands::Files(args) => run_command("files", files(args, store)).await,
        Commands::Orphans(args) => run_command("orphans", orphans(args, store)).await,
        Commands::Conditions(command) => run_command("conditions", conditions(command, store)).await,
        Commands::Exclusions(command) => run_command("exclusions", exclusions(command, store)).await,
    }
}

pub fn rule_table(settings: &ResolverSettings) -> RuleTable {
    RuleTable::builtin().with_overlay(RuleOverlay {
        conditions: settings.conditions.clone(),
        disabled_conditions: settings.disabled_conditions.clone(),
        skip_rules: settings.skip_rules.clone(),
        orphan_skip_rules: settings.orphan_skip_rules.clone(),
    })
}

pub fn resolver_roots(settings: &ResolverSettings) -> ResolverRoots {
    ResolverRoots::from_env().with_overrides(&settings.search_roots, &settings.residue_roots)
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .with_code("output_serialize_failed", "could not serialize output")?;
    println!("{text}");
    Ok(())
}

pub fn render_lines(result: &ResolutionResult, sizes: bool) -> Vec<String> {
    result
        .candidates
        .iter()
        .map(|candidate| match (sizes, candidate.size) {
            (true, Some(size)) => format!("{}\t{}", size.real_bytes, candidate.path.display()),
            (true, None) => format!("-\t{}", candidate.path.display()),
            (false, _) => candidate.path.display().to_string(),
        })
        .collect()
}

fn print_result(result: &ResolutionResult, json: bool, sizes: bool) -> AppResult<()> {
    if json {
        return print_json(result);
    }
    for line in render_lines(result, sizes) {
        println!("{line}");
    }
    if sizes {
        println!("total\t{} bytes ({} logical)", result.total_real_bytes, result.total_logical_bytes);
    }
    Ok(())
}

async fn locate_app(target: String, home: Option<PathBuf>) -> AppResult<AppDescriptor> {
    run_blocking("files_locate_app", move || match bundle_target(&target) {
        Some(path) => read_app_descriptor(&path),
        None => find_app(&target, &installed_apps(&application_dirs(home.as_deref()))),
    })
    .await
}

async fn files(args: FilesArgs, store: &SettingsStore) -> AppResult<()> {
    let settings = store.load()?;
    let roots = resolver_roots(&settings);
    let app = locate_app(args.target, roots.home.clone()).await?;
    tracing::info!(
        event = "files_app_located",
        identifier = %app.bundle_identifier,
        path = %residue_logging::sanitize_path(&app.bundle_path)
    );

    let rules = RuleStore::new(rule_table(&settings));
    let probe = args
        .sizes
        .then(|| Arc::new(FsSizeProbe) as Arc<dyn SizeProbe>);
    let result = resolve_app_files(&app, &roots, &rules, probe).await;
    print_result(&result, args.json, args.sizes)
}

fn progress_mode(batch_size: usize) -> OrphanMode {
    if batch_size == 0 {
        return OrphanMode::Buffered;
    }
    let mut reported = 0usize;
    OrphanMode::Streaming {
        batch_size,
        on_batch: Box::new(move |batch| {
            reported += batch.len();
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "found {reported} orphans...");
        }),
    }
}

fn cancel_on_interrupt(cancel: ScanCancel) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(event = "orphan_scan_interrupted");
            cancel.cancel();
        }
    });
}

async fn orphans(args: OrphansArgs, store: &SettingsStore) -> AppResult<()> {
    let settings = store.load()?;
    let roots = resolver_roots(&settings);
    let mut dirs = application_dirs(roots.home.as_deref());
    dirs.extend(args.apps_dirs);
    let installed = run_blocking("orphans_installed_apps", move || Ok(installed_apps(&dirs))).await?;

    let rules = RuleStore::new(rule_table(&settings));
    let cancel = ScanCancel::new();
    cancel_on_interrupt(cancel.clone());
    let result = resolve_orphans(
        &installed,
        &settings.orphan_exclusions,
        &roots,
        &rules,
        progress_mode(args.batch_size),
        &cancel,
    )
    .await;
    if result.cancelled {
        eprintln!("interrupted; showing partial results");
    }
    print_result(&result, args.json, false)
}

fn condition_from_args(args: ConditionArgs) -> AppResult<Condition> {
    let key = normalize(&args.key);
    if key.is_empty() {
        return Err(AppError::new("condition_key_invalid", "condition key has no letters or digits")
            .with_context("key", args.key));
    }
    Ok(Condition {
        key,
        include: args.include,
        exclude: args.exclude,
        include_force: args.include_force,
        exclude_force: args.exclude_force,
    })
}

/// Stores `condition`, re-enabling a disabled built-in with the same key. Returns
/// whether an active condition with that key was already in effect.
pub fn add_condition(settings: &mut ResolverSettings, condition: Condition) -> bool {
    let replaced = rule_table(settings)
        .conditions()
        .iter()
        .any(|existing| existing.key == condition.key);
    settings
        .disabled_conditions
        .retain(|value| normalize(value) != condition.key);
    settings.conditions.push(condition);
    replaced
}

/// Removes a configured condition; keys that only exist built in are disabled instead.
pub fn remove_condition(settings: &mut ResolverSettings, key: &str) -> bool {
    let before = settings.conditions.len();
    settings.conditions.retain(|condition| normalize(&condition.key) != key);
    let removed = settings.conditions.len() != before;
    let builtin = RuleTable::builtin()
        .conditions()
        .iter()
        .any(|condition| condition.key == key);
    if builtin && !settings.disabled_conditions.iter().any(|value| normalize(value) == key) {
        settings.disabled_conditions.push(key.to_string());
        return true;
    }
    removed
}

async fn conditions(command: ConditionCommand, store: &SettingsStore) -> AppResult<()> {
    match command {
        ConditionCommand::List { json } => {
            let table = rule_table(&store.load()?);
            if json {
                return print_json(&table.conditions());
            }
            for condition in table.conditions() {
                println!(
                    "{}\tinclude={}\texclude={}",
                    condition.key,
                    condition.include.join(","),
                    condition.exclude.join(",")
                );
            }
            Ok(())
        }
        ConditionCommand::Add(args) => {
            let condition = condition_from_args(args)?;
            let key = condition.key.clone();
            let mut replaced = false;
            store.update(|settings| replaced = add_condition(settings, condition))?;
            println!("{} condition {key}", if replaced { "replaced" } else { "added" });
            Ok(())
        }
        ConditionCommand::Remove { key } => {
            let key = normalize(&key);
            let mut changed = false;
            store.update(|settings| changed = remove_condition(settings, &key))?;
            if !changed {
                return Err(AppError::new("condition_not_found", "no condition with that key")
                    .with_context("key", key));
            }
            println!("removed condition {key}");
            Ok(())
        }
    }
}

async fn exclusions(command: ExclusionCommand, store: &SettingsStore) -> AppResult<()> {
    match command {
        ExclusionCommand::List => {
            for exclusion in store.load()?.orphan_exclusions {
                println!("{exclusion}");
            }
        }
        ExclusionCommand::Add { path } => {
            let path = path.trim().to_string();
            store.update(|settings| settings.orphan_exclusions.push(path.clone()))?;
            println!("excluded {path}");
        }
        ExclusionCommand::Remove { path } => {
            let path = path.trim().to_string();
            let mut removed = false;
            store.update(|settings| {
                let before = settings.orphan_exclusions.len();
                settings.orphan_exclusions.retain(|value| value != &path);
                removed = settings.orphan_exclusions.len() != before;
            })?;
            if !removed {
                return Err(AppError::new("exclusion_not_found", "path is not excluded")
                    .with_context("path", path));
            }
            println!("removed exclusion {path}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/cli/commands_tests.rs"]
mod commands_tests;
