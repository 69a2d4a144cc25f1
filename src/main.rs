mod bundle;
mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use residue_protocol::AppError;
use residue_settings::SettingsStore;
use std::process::ExitCode;

fn report(error: &AppError) -> ExitCode {
    eprintln!("error: {error}");
    for (key, value) in &error.context {
        eprintln!("  {key}: {value}");
    }
    for cause in &error.causes {
        eprintln!("  caused by: {cause}");
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let store = match SettingsStore::default_location() {
        Ok(store) => store,
        Err(error) => return report(&error),
    };
    let _logging = match residue_logging::init_logging(&store.data_dir(), cli.verbose) {
        Ok(guard) => Some(guard),
        Err(error) => {
            eprintln!("warning: logging disabled ({error})");
            None
        }
    };

    match commands::dispatch(cli.command, &store).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(&error),
    }
}
