use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Parser)]
#[command(
    name = "residue",
    version,
    about = "Find the files a macOS application leaves behind, and the ones nobody owns"
)]
pub struct Cli {
    /// Mirror log output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every file that belongs to an application
    Files(FilesArgs),

    /// List leftovers that belong to no installed application
    Orphans(OrphansArgs),

    /// Manage per-application ownership conditions
    #[command(subcommand)]
    Conditions(ConditionCommand),

    /// Manage paths never reported as orphans
    #[command(subcommand)]
    Exclusions(ExclusionCommand),
}

#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Path to a `.app` bundle, or the bundle identifier or name of an installed app
    pub target: String,

    /// Print JSON instead of one path per line
    #[arg(long)]
    pub json: bool,

    /// Measure disk usage of every result
    #[arg(long)]
    pub sizes: bool,
}

#[derive(Debug, Args)]
pub struct OrphansArgs {
    /// Print JSON instead of one path per line
    #[arg(long)]
    pub json: bool,

    /// Report progress on stderr every N orphans; 0 disables progress
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Additional application directories to treat as installed
    #[arg(long = "apps-dir", value_name = "DIR")]
    pub apps_dirs: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ConditionCommand {
    /// Show built-in and configured conditions
    List {
        #[arg(long)]
        json: bool,
    },
    /// Add or replace a condition
    Add(ConditionArgs),
    /// Remove a configured condition, or disable a built-in one
    Remove { key: String },
}

#[derive(Debug, Args)]
pub struct ConditionArgs {
    /// Bundle identifier fragment the condition applies to
    pub key: String,

    /// Entry names that belong to the app
    #[arg(long, value_name = "WORD")]
    pub include: Vec<String>,

    /// Entry names that never belong to the app
    #[arg(long, value_name = "WORD")]
    pub exclude: Vec<String>,

    /// Paths always reported for the app
    #[arg(long, value_name = "PATH")]
    pub include_force: Vec<PathBuf>,

    /// Paths never reported for the app
    #[arg(long, value_name = "PATH")]
    pub exclude_force: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ExclusionCommand {
    List,
    Add { path: String },
    Remove { path: String },
}

#[cfg(test)]
#[path = "../tests/cli/cli_tests.rs"]
mod cli_tests;
