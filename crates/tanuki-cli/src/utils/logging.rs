//! Logging initialization and configuration.
//!
//! Sets up the tracing subscriber and color control from CLI flags and
//! environment variables.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Commands};
use crate::output::OutputFormat;

/// Log level for the given flags.
///
/// Machine-readable output keeps stderr down to errors unless `--verbose`
/// was given explicitly.
fn level_for(cli: &Cli) -> Level {
    if cli.verbose {
        return Level::DEBUG;
    }
    if cli.quiet || machine_output(cli) {
        return Level::ERROR;
    }
    Level::WARN
}

fn machine_output(cli: &Cli) -> bool {
    matches!(&cli.command, Commands::Search(args) if args.format == OutputFormat::Jsonl)
}

/// Initialize the logging subsystem based on CLI flags.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_for(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Color control: disable when requested, NO_COLOR is set, or when emitting machine output
    let env_no_color = std::env::var_os("NO_COLOR").is_some();
    if cli.no_color || env_no_color || machine_output(cli) {
        color_control::set_override(false);
    }
    Ok(())
}
