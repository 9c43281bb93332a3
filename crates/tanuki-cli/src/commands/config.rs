//! `tanuki config`: show or persist the effective connection settings.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use tanuki_core::Settings;
use tracing::info;

/// Print the settings and, with `write`, save them to `path` first.
pub fn execute(settings: &Settings, path: &Path, write: bool) -> Result<()> {
    if write {
        settings.to_config().save_to(path)?;
        info!("Saved configuration to {}", path.display());
    }
    render(settings, path, write, &mut std::io::stdout())
}

fn render(settings: &Settings, path: &Path, written: bool, out: &mut impl Write) -> Result<()> {
    let status = if written {
        "saved".green().to_string()
    } else if path.exists() {
        "loaded".to_string()
    } else {
        "not created yet".dimmed().to_string()
    };
    writeln!(out, "{} {} ({status})", "config:".bold(), path.display())?;
    writeln!(out, "{} {}", "server:".bold(), settings.server)?;
    match settings.token {
        Some(_) => writeln!(out, "{} {}", "token: ".bold(), settings.obfuscated_token())?,
        None => writeln!(out, "{} {}", "token: ".bold(), "(none)".dimmed())?,
    }
    Ok(())
}
