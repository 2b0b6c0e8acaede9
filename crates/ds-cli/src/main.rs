//! ds CLI
//!
//! Reports and records the state of datasets: git repositories with nested
//! repositories and optional content stores.

mod cli;
mod commands;
mod error;
mod logging;
mod render;

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::SaveArgs;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {e}", "warning".yellow().bold());
    }
    tracing::debug!(command = ?cli.command, "Starting");

    let cwd = std::env::current_dir()?;
    let ds = commands::open_dataset(&cwd, cli.dataset.as_deref())?;
    // without --dataset, relative paths are relative to the working directory
    let anchor = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
        if cli.dataset.is_some() {
            paths
        } else {
            paths.into_iter().map(|p| cwd.join(p)).collect()
        }
    };

    let records = match cli.command.clone() {
        Commands::Status {
            paths,
            inspect,
            recursive,
            recursion_limit,
            annex,
        } => commands::run_status(
            &ds,
            anchor(paths),
            &inspect,
            recursive,
            recursion_limit,
            annex.as_deref(),
        )?,
        Commands::Diff {
            paths,
            from,
            to,
            inspect,
        } => commands::run_diff(&ds, anchor(paths), from, to, &inspect)?,
        Commands::Save {
            paths,
            message,
            message_file,
            recursive,
            recursion_limit,
            updated,
            to_git,
            to_annex,
            version_tag,
        } => commands::run_save(
            &ds,
            SaveArgs {
                paths: anchor(paths),
                message,
                message_file: message_file.map(|f| absolute_from(&cwd, f)),
                recursive,
                recursion_limit,
                updated,
                to_git,
                to_annex,
                version_tag,
            },
        )?,
    };

    let failed = render::render(&mut std::io::stdout().lock(), &records, cli.json)?;
    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} results failed",
            records.len()
        )));
    }
    Ok(())
}

fn absolute_from(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { cwd.join(path) }
}
