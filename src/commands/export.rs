//! `dbsync export <path>`: dump the database into a gzip artifact.
//!
//! # Steps
//!
//! | # | Step      | Failure                                            |
//! |---|-----------|----------------------------------------------------|
//! | 1 | Validate  | `DBNAME` / `BACKUPDIR` empty → missing value       |
//! |   |           | `DBNAME` with a path separator → invalid value     |
//! | 2 | Directory | `mkdir -p BACKUPDIR` fails → create-dir error      |
//! | 3 | Dump      | mysqldump stdout streamed through gzip to the file |
//! | 4 | Classify  | exit 2 → auth failure, other non-zero → raw status |
//!
//! The artifact is `<DBNAME>-<YYYYmmdd-HHMMSS>.sql.gz`.  It is opened with
//! `create_new`, so an existing backup is never clobbered, and it is removed
//! again if anything after its creation fails.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use flate2::{Compression, write::GzEncoder};
use indicatif::HumanBytes;
use tracing::{info, warn};

use crate::{
    config::{Config, Key},
    error::{BackupError, BackupResult},
    runner::{classify_dump_exit, dump_env, mysqldump_args},
    ui::{PipedChild, StageOutcome, make_spinner},
};

/// Timestamp format embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Run the export and return the artifact path.
pub fn run(cfg: &Config) -> BackupResult<PathBuf> {
    let db_name = cfg.require(Key::DbName)?;
    check_file_stem(db_name)?;
    cfg.require(Key::BackupDir)?;

    let dir = cfg.backup_dir();
    ensure_dir(&dir)?;

    let path = dir.join(artifact_name(db_name, Local::now().naive_local()));
    let label = format!("Dump {db_name}");

    let spinner = make_spinner(&label);
    let dump = dump_to_gzip(&mysqldump_args(cfg), &dump_env(cfg), &path);
    spinner.finish_and_clear();

    match dump.result {
        Ok(bytes_in) => {
            StageOutcome::ok(&label).print();
            if !dump.stderr.trim().is_empty() {
                warn!(stderr = %dump.stderr.trim(), "mysqldump wrote to stderr");
            }
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            info!(path = %path.display(), bytes_in, bytes_out = size, "artifact written");

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!();
            println!("  Backup completed: {name} ({})", HumanBytes(size));
            println!();
            Ok(path)
        },
        Err(e) => {
            StageOutcome::failed(&label, &e, dump.stderr).print();
            Err(e)
        },
    }
}

// ─── Steps ────────────────────────────────────────────────────────────────────

/// `mkdir -p dir`.
pub fn ensure_dir(dir: &Path) -> BackupResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| BackupError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    info!(dir = %dir.display(), "created backup directory");
    Ok(())
}

/// `DBNAME` becomes part of the artifact file name, so it must name a file
/// inside `BACKUPDIR` and nothing else.
pub fn check_file_stem(db_name: &str) -> BackupResult<()> {
    let reason = if db_name.contains(['/', '\\']) {
        "must not contain a path separator"
    } else if db_name == "." || db_name == ".." {
        "must not be a relative directory"
    } else {
        return Ok(());
    };
    Err(BackupError::InvalidValue {
        key: Key::DbName.name(),
        value: db_name.to_string(),
        reason,
    })
}

/// `<db>-<YYYYmmdd-HHMMSS>.sql.gz`
pub fn artifact_name(db_name: &str, at: NaiveDateTime) -> String {
    format!("{db_name}-{}.sql.gz", at.format(TIMESTAMP_FORMAT))
}

/// Result of one dump attempt.  `stderr` is kept on both paths so it can be
/// shown on failure and logged on success.
#[derive(Debug)]
pub struct DumpRun {
    /// Uncompressed bytes read from the dump tool.
    pub result: BackupResult<u64>,
    pub stderr: String,
}

/// Run the dump command and stream its stdout through gzip into `path`.
///
/// `path` must not exist yet.  On any failure after it was created the file
/// is removed.
pub fn dump_to_gzip(args: &[String], env: &[(&str, String)], path: &Path) -> DumpRun {
    let file = match create_artifact(path) {
        Ok(f) => f,
        Err(e) => {
            return DumpRun {
                result: Err(e),
                stderr: String::new(),
            };
        },
    };

    let mut stderr = String::new();
    let result = stream_into(args, env, file, path, &mut stderr);

    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove partial artifact");
        }
    }

    DumpRun { result, stderr }
}

fn create_artifact(path: &Path) -> BackupResult<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| BackupError::CreateArtifact {
            path: path.to_path_buf(),
            source,
        })
}

fn stream_into(
    args: &[String],
    env: &[(&str, String)],
    file: File,
    path: &Path,
    stderr: &mut String,
) -> BackupResult<u64> {
    let write_err = |source: io::Error| BackupError::WriteArtifact {
        path: path.to_path_buf(),
        source,
    };

    let mut child = PipedChild::spawn(args, env)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    let copied = match child.stdout() {
        Some(mut out) => io::copy(&mut out, &mut encoder),
        None => Ok(0),
    };

    // Always reap the child, even if the copy failed.
    let finished = child.wait()?;
    *stderr = finished.stderr;

    let bytes_in = copied.map_err(write_err)?;
    classify_dump_exit(finished.success, finished.code)?;

    let writer = encoder.finish().map_err(write_err)?;
    let file = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;

    Ok(bytes_in)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
