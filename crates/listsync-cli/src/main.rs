//! listsync CLI - reconcile the portal's reference lists from the terminal
//!
//! Syncs the built-in (or file-provided) list definitions into a local libSQL
//! database or the managed backend, and inspects what is stored.

mod cli;
mod commands;
mod error;


use clap::Parser;
use listsync_core::config::BackendConfig;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::common::{resolve_backend, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::definitions::run_definitions;
use crate::commands::lists::run_lists;
use crate::commands::sync::{run_sync, SyncOptions};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("listsync=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync {
            target,
            file,
            startup,
            json,
        } => {
            let config = BackendConfig::from_env()?;
            let backend = resolve_backend(cli.backend, &config);
            let options = SyncOptions {
                target,
                file: file.as_deref(),
                startup,
                as_json: json,
            };
            run_sync(&options, backend, &db_path, &config).await?;
        }
        Commands::Check { target, file, json } => {
            let config = BackendConfig::from_env()?;
            let backend = resolve_backend(cli.backend, &config);
            run_check(target, file.as_deref(), json, backend, &db_path, &config).await?;
        }
        Commands::Lists { target, json } => {
            let config = BackendConfig::from_env()?;
            let backend = resolve_backend(cli.backend, &config);
            run_lists(target, json, backend, &db_path, &config).await?;
        }
        Commands::Definitions { target } => run_definitions(target)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
