//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, error::ErrorKind};

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name    = "dbsync",
    about   = "Dump a MySQL database to gzip and mirror the backups to rclone remotes",
    version,
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Verb to run.  Without one, usage is printed.
    #[command(subcommand)]
    pub command: Option<Verb>,

    /// Print the parsed configuration (password redacted) and exit without
    /// running mysqldump or rclone.  Only valid with `export` and `sync`.
    #[arg(long, global = true)]
    pub print_config: bool,

    /// Increase log verbosity (-v info, -vv debug).  Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// The three verbs.  Each takes the config file path as its only positional
/// argument.
#[derive(clap::Subcommand, Debug, PartialEq)]
pub enum Verb {
    /// Write an empty configuration template with owner-only permissions.
    ///
    /// Refuses to replace an existing file unless `--force` is given.
    Init {
        /// Path of the configuration file to create.
        config: Option<PathBuf>,

        /// Overwrite an existing file (its permissions are reset to 0600).
        #[arg(long)]
        force: bool,
    },

    /// Run mysqldump and write `<DBNAME>-<timestamp>.sql.gz` into BACKUPDIR.
    Export {
        /// Path of the configuration file to read.
        config: Option<PathBuf>,
    },

    /// Mirror BACKUPDIR to every remote in RCLONEREMOTES, in order.
    #[command(alias = "rclone")]
    Sync {
        /// Path of the configuration file to read.
        config: Option<PathBuf>,
    },
}

impl Verb {
    /// The config path, if one was given.
    pub fn config(&self) -> Option<&Path> {
        match self {
            Self::Init { config, .. } | Self::Export { config } | Self::Sync { config } => {
                config.as_deref()
            },
        }
    }
}

/// Whether a parse failure should print usage and exit zero instead.
///
/// Fewer than two arguments after the program name is never an error, even
/// when the one argument given is not a known verb.  `argc` includes the
/// program name.
pub fn is_short_invocation(kind: ErrorKind, argc: usize) -> bool {
    argc < 3 && matches!(kind, ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument)
}
