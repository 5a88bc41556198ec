//! Configuration types and loading logic.
//!
//! The config file is a flat list of `KEY=value` lines.  Bracketed section
//! headers may be used to group keys visually but carry no meaning; they are
//! skipped like any other unrecognised line.
//!
//! # File format
//!
//! ```text
//! [mysql]
//! DBHOST=db.lan
//! DBPORT=3306
//! DBNAME=shop
//! DBUSER=backup
//! DBPASS=hunter2
//! BACKUPDIR=/var/backups/mysql
//!
//! [rclone]
//! RCLONEREMOTES=b2, gdrive
//! RCLONEDIR=mysql/shop
//! ```
//!
//! Values are taken verbatim after the `=`; there is no quoting and no
//! trimming.  Missing keys yield empty strings.  If a key appears more than
//! once, the last occurrence wins.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{BackupError, BackupResult};

// ─── Keys ─────────────────────────────────────────────────────────────────────

/// Every key the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    DbHost,
    DbPort,
    DbName,
    DbUser,
    DbPass,
    BackupDir,
    RcloneRemotes,
    RcloneDir,
}

impl Key {
    /// All keys, in template order.
    pub const ALL: [Self; 8] = [
        Self::DbHost,
        Self::DbPort,
        Self::DbName,
        Self::DbUser,
        Self::DbPass,
        Self::BackupDir,
        Self::RcloneRemotes,
        Self::RcloneDir,
    ];

    /// Name as it appears in the file, without the trailing `=`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DbHost => "DBHOST",
            Self::DbPort => "DBPORT",
            Self::DbName => "DBNAME",
            Self::DbUser => "DBUSER",
            Self::DbPass => "DBPASS",
            Self::BackupDir => "BACKUPDIR",
            Self::RcloneRemotes => "RCLONEREMOTES",
            Self::RcloneDir => "RCLONEDIR",
        }
    }

    /// Value following `KEY=` on `line`, if the line belongs to this key.
    fn strip<'a>(self, line: &'a str) -> Option<&'a str> {
        line.strip_prefix(self.name())?.strip_prefix('=')
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// Parsed configuration.  Every field defaults to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    pub db_host: String,
    pub db_port: String,
    pub db_name: String,
    pub db_user: String,
    pub db_pass: String,
    pub backup_dir: String,
    pub rclone_remotes: String,
    pub rclone_dir: String,
}

impl Config {
    fn slot(&mut self, key: Key) -> &mut String {
        match key {
            Key::DbHost => &mut self.db_host,
            Key::DbPort => &mut self.db_port,
            Key::DbName => &mut self.db_name,
            Key::DbUser => &mut self.db_user,
            Key::DbPass => &mut self.db_pass,
            Key::BackupDir => &mut self.backup_dir,
            Key::RcloneRemotes => &mut self.rclone_remotes,
            Key::RcloneDir => &mut self.rclone_dir,
        }
    }

    /// Value of `key`.
    pub fn get(&self, key: Key) -> &str {
        match key {
            Key::DbHost => &self.db_host,
            Key::DbPort => &self.db_port,
            Key::DbName => &self.db_name,
            Key::DbUser => &self.db_user,
            Key::DbPass => &self.db_pass,
            Key::BackupDir => &self.backup_dir,
            Key::RcloneRemotes => &self.rclone_remotes,
            Key::RcloneDir => &self.rclone_dir,
        }
    }

    /// Value of `key`, or [`BackupError::MissingValue`] when it is empty.
    pub fn require(&self, key: Key) -> BackupResult<&str> {
        match self.get(key) {
            "" => Err(BackupError::MissingValue { key: key.name() }),
            v => Ok(v),
        }
    }

    /// Remote names from `RCLONEREMOTES`, in listed order.
    ///
    /// Commas and whitespace both separate entries, so `a, b`, `a,b` and
    /// `a b` are equivalent.  Empty entries are dropped.
    pub fn remotes(&self) -> Vec<&str> {
        self.rclone_remotes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// `BACKUPDIR` as a path, with a leading `~/` expanded to the home
    /// directory.
    pub fn backup_dir(&self) -> PathBuf {
        expand_home(&self.backup_dir)
    }

    /// Copy of the config that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if !cfg.db_pass.is_empty() {
            cfg.db_pass = "********".into();
        }
        cfg
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs_next::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

// ─── Template ─────────────────────────────────────────────────────────────────

/// Starter file written by `dbsync init`: every key present, every value empty.
pub const TEMPLATE: &str = "\
[mysql]
DBHOST=
DBPORT=
DBNAME=
DBUSER=
DBPASS=
BACKUPDIR=

[rclone]
RCLONEREMOTES=
RCLONEDIR=
";

// ─── Parser / loader ──────────────────────────────────────────────────────────

/// Parse config text.  Never fails: unknown lines are ignored.
pub fn parse_config(text: &str) -> Config {
    let mut cfg = Config::default();
    // `lines()` also strips a trailing `\r`, so CRLF files parse cleanly.
    for line in text.lines() {
        for key in Key::ALL {
            if let Some(value) = key.strip(line) {
                *cfg.slot(key) = value.to_string();
                break;
            }
        }
    }
    cfg
}

/// Read and parse the config at `path`.  The file is read fresh every call.
pub fn load_config(path: &Path) -> BackupResult<Config> {
    let text = std::fs::read_to_string(path).map_err(|source| BackupError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = parse_config(&text);
    debug!(path = %path.display(), db = %cfg.db_name, "configuration loaded");
    Ok(cfg)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
