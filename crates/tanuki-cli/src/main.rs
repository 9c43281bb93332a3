//! tanuki CLI - search code across every project of a GitLab group
//!
//! This is the main entry point for the tanuki command-line interface.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tanuki_core::Config;
use tracing::debug;

mod cli;
mod commands;
mod error;
mod output;
mod utils;

use cli::{Cli, Commands};
use error::ErrorCategory;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = utils::logging::initialize_logging(&cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        return ErrorCategory::Internal.as_exit_code();
    }

    match execute_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = ErrorCategory::from_anyhow(&err);
            eprintln!("{} {err:#}", format!("{category}:").red().bold());
            category.as_exit_code()
        },
    }
}

async fn execute_command(cli: Cli) -> Result<()> {
    let path = Config::path_in(cli.config_dir.as_deref())?;
    let settings =
        Config::load_from(&path)?.resolve(cli.server.as_deref(), cli.token.as_deref());
    debug!("Using server {} (config {})", settings.server, path.display());

    match cli.command {
        Commands::Search(args) => commands::search::execute(&args, &settings).await,
        Commands::Config { write } => commands::config::execute(&settings, &path, write),
    }
}
