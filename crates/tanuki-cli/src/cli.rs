//! # CLI Structure and Argument Parsing
//!
//! The command-line interface for `tanuki`, built with `clap` derive macros.
//!
//! ```bash
//! # Search every project of groups matching "backend"
//! tanuki search --group backend hello_there
//!
//! # Stop after the first five matches, as JSON lines
//! tanuki search -g backend --max-results 5 --format jsonl unwrap
//!
//! # Show or persist the connection settings
//! tanuki --server https://gitlab.example.com --token glpat-... config --write
//! ```
//!
//! Server and token come from the flags, then the `TANUKI_SERVER` and
//! `TANUKI_TOKEN` environment variables, then the config file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tanuki_core::DEFAULT_PAGE_SIZE;
use tanuki_core::concurrent::DEFAULT_QUEUE_CAPACITY;

use crate::output::OutputFormat;

/// Main CLI structure for the `tanuki` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "tanuki")]
#[command(version)]
#[command(about = "Search code across every project of a GitLab group", long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// GitLab server URL [default: https://gitlab.com]
    #[arg(short = 's', long, global = true, env = "TANUKI_SERVER")]
    pub server: Option<String>,

    /// Personal access token sent as `PRIVATE-TOKEN`
    #[arg(short = 't', long, global = true, env = "TANUKI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding config.toml
    #[arg(long, global = true, env = "TANUKI_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also honors `NO_COLOR`)
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Search blobs in the projects of matching groups
    Search(SearchArgs),

    /// Show the effective configuration
    Config {
        /// Persist the effective server and token to the config file
        #[arg(short = 'w', long)]
        write: bool,
    },
}

/// Arguments for `tanuki search`.
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Text to search for
    pub query: String,

    /// Group name fragment; empty searches every visible group
    #[arg(short = 'g', long, default_value = "")]
    pub group: String,

    /// Items requested per page from every endpoint
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub per_page: u32,

    /// Stop after this many matching blobs
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Run each stage on its own task
    #[arg(long)]
    pub concurrent: bool,

    /// Batches buffered between stages with --concurrent
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Skip a failing group or project instead of aborting
    #[arg(long)]
    pub isolate_failures: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Retries per request after a transient failure
    #[arg(long, default_value_t = 2)]
    pub retries: u32,

    /// Include projects of subgroups
    #[arg(long)]
    pub include_subgroups: bool,

    /// Use keyset pagination when listing group projects
    #[arg(long)]
    pub keyset: bool,
}
