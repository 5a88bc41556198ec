//! Error taxonomy shared by every command.
//!
//! Handlers return [`BackupError`]; `main` lifts it into `anyhow` so the
//! process exits non-zero with a readable message.  Every variant is terminal
//! for the current invocation.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias used by the command handlers.
pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug, Error)]
pub enum BackupError {
    // ── configuration file ────────────────────────────────────────────────────
    #[error("error reading configuration file {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("error creating configuration file {}: {source}", .path.display())]
    ConfigWrite { path: PathBuf, source: io::Error },

    #[error("{} already exists, refusing to overwrite (pass --force)", .path.display())]
    ConfigExists { path: PathBuf },

    #[error("{key} is not specified in the configuration file")]
    MissingValue { key: &'static str },

    #[error("{key}={value} is invalid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    // ── filesystem ────────────────────────────────────────────────────────────
    #[error("error creating backup directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("error creating backup file {}: {source}", .path.display())]
    CreateArtifact { path: PathBuf, source: io::Error },

    #[error("error writing backup content to {}: {source}", .path.display())]
    WriteArtifact { path: PathBuf, source: io::Error },

    // ── external tools ────────────────────────────────────────────────────────
    #[error("failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("authentication failed or database does not exist")]
    DumpAuth,

    #[error("mysqldump failed: {}", exit_label(.code))]
    DumpExit { code: Option<i32> },

    #[error("rclone sync to remote '{remote}' failed: {}", exit_label(.code))]
    SyncFailed { remote: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match *code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".into(),
    }
}
