//! `dbsync`: MySQL dumps to gzip, mirrored to rclone remotes.
//!
//! # Overview
//!
//! A thin orchestration layer around two external tools: `mysqldump`
//! produces the SQL, `rclone` mirrors the backup directory to one or more
//! remotes.  Everything is driven by a flat `KEY=value` config file.
//!
//! # Usage
//!
//! ```text
//! dbsync init   db.conf            # write an empty template (mode 0600)
//! dbsync export db.conf            # BACKUPDIR/<DBNAME>-<ts>.sql.gz
//! dbsync sync   db.conf            # rclone sync to every remote, in order
//! dbsync export db.conf --print-config
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                              |
//! |--------------------------|---------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap               |
//! | [`config`]               | `Config` struct + flat-file parser          |
//! | [`error`]                | `BackupError` taxonomy                      |
//! | [`runner`]               | Argument construction, exit classification  |
//! | [`ui`]                   | Spinner, child processes, stage output      |
//! | [`commands::init`]       | `dbsync init`                               |
//! | [`commands::export`]     | `dbsync export`                             |
//! | [`commands::sync`]       | `dbsync sync`                               |

mod cli;
mod commands;
mod config;
mod error;
mod runner;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Verb};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if cli::is_short_invocation(e.kind(), std::env::args_os().len()) => {
            return print_usage();
        },
        Err(e) => e.exit(),
    };
    init_tracing(cli.verbose);

    let Some(verb) = &cli.command else {
        return print_usage();
    };
    let Some(path) = verb.config() else {
        return print_usage();
    };

    match verb {
        // ── dbsync init ───────────────────────────────────────────────────────
        Verb::Init { force, .. } => {
            if cli.print_config {
                anyhow::bail!("--print-config applies only to export and sync");
            }
            commands::init::run(path, *force)?;
        },

        // ── dbsync export / sync ──────────────────────────────────────────────
        Verb::Export { .. } | Verb::Sync { .. } => {
            let cfg = config::load_config(path)?;

            if cli.print_config {
                let text = toml::to_string(&cfg.redacted()).context("rendering configuration")?;
                print!("{text}");
                return Ok(());
            }

            if matches!(verb, Verb::Export { .. }) {
                commands::export::run(&cfg)?;
            } else {
                commands::sync::run(&cfg)?;
            }
        },
    }

    Ok(())
}

/// Fewer than two arguments is not an error, whatever they are: show usage
/// and exit zero.
fn print_usage() -> Result<()> {
    Cli::command().print_help().context("printing usage")?;
    println!();
    Ok(())
}

/// Logs go to stderr so they never interleave with a piped stdout.
///
/// `RUST_LOG` wins when set; otherwise `-v` / `-vv` raise the level from
/// `warn`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
