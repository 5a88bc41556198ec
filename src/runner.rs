//! Command argument construction helpers.
//!
//! This module only *builds* argument lists and interprets exit codes.
//! Process execution lives in [`crate::ui`], so everything here is pure and
//! unit-testable without `mysqldump` or `rclone` installed.

use crate::{
    config::Config,
    error::{BackupError, BackupResult},
};

/// Dump tool invoked by `export`.
pub const DUMP_TOOL: &str = "mysqldump";

/// Sync tool invoked by `sync`.
pub const SYNC_TOOL: &str = "rclone";

/// mysqldump exits with this code when it cannot connect, which in practice
/// means bad credentials or an unknown database.
pub const DUMP_AUTH_EXIT: i32 = 2;

/// Environment variable mysqldump reads the password from.
pub const DUMP_PASSWORD_ENV: &str = "MYSQL_PWD";

// ─── mysqldump ────────────────────────────────────────────────────────────────

/// Builds the dump invocation:
///
/// ```text
/// mysqldump  [-h<host>]  [-P<port>]  [-u<user>]  <dbname>
/// ```
///
/// Empty fields are left out rather than passed as bare flags.  The password
/// is not part of the argument list; see [`dump_env`].
pub fn mysqldump_args(cfg: &Config) -> Vec<String> {
    let mut cmd: Vec<String> = vec![DUMP_TOOL.into()];
    for (flag, value) in [("-h", &cfg.db_host), ("-P", &cfg.db_port), ("-u", &cfg.db_user)] {
        if !value.is_empty() {
            cmd.push(format!("{flag}{value}"));
        }
    }
    cmd.push(cfg.db_name.clone());
    cmd
}

/// Environment to set on the dump process.  Keeps the password out of the
/// process table.
pub fn dump_env(cfg: &Config) -> Vec<(&'static str, String)> {
    if cfg.db_pass.is_empty() {
        vec![]
    } else {
        vec![(DUMP_PASSWORD_ENV, cfg.db_pass.clone())]
    }
}

/// Map a finished dump's exit code to a result.
///
/// `None` means the process was killed by a signal.
pub fn classify_dump_exit(success: bool, code: Option<i32>) -> BackupResult<()> {
    match (success, code) {
        (true, _) => Ok(()),
        (false, Some(DUMP_AUTH_EXIT)) => Err(BackupError::DumpAuth),
        (false, code) => Err(BackupError::DumpExit { code }),
    }
}

// ─── rclone ───────────────────────────────────────────────────────────────────

/// Destination string `remote:path`.
pub fn remote_target(remote: &str, dir: &str) -> String {
    format!("{remote}:{dir}")
}

/// Builds one sync invocation:
///
/// ```text
/// rclone  sync  -v  <backup_dir>  <remote>:<rclone_dir>
/// ```
pub fn rclone_args(cfg: &Config, remote: &str) -> Vec<String> {
    vec![
        SYNC_TOOL.into(),
        "sync".into(),
        "-v".into(),
        cfg.backup_dir().to_string_lossy().into_owned(),
        remote_target(remote, &cfg.rclone_dir),
    ]
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cfg() -> Config {
        Config {
            db_host: "db.lan".into(),
            db_port: "3306".into(),
            db_name: "shop".into(),
            db_user: "backup".into(),
            db_pass: "hunter2".into(),
            backup_dir: "/var/backups/mysql".into(),
            rclone_remotes: "b2, gdrive".into(),
            rclone_dir: "mysql/shop".into(),
        }
    }

    // ── mysqldump_args ────────────────────────────────────────────────────────

    #[test]
    fn dump_args_end_with_database() {
        let args = mysqldump_args(&make_cfg());
        assert_eq!(args.first().unwrap(), "mysqldump");
        assert_eq!(args.last().unwrap(), "shop");
    }

    #[test]
    fn dump_args_never_contain_password() {
        let args = mysqldump_args(&make_cfg());
        assert!(args.iter().all(|a| !a.contains("hunter2")));
    }

    #[test]
    fn dump_args_skip_empty_fields() {
        let mut cfg = make_cfg();
        cfg.db_host.clear();
        cfg.db_port.clear();
        let args = mysqldump_args(&cfg);
        assert_eq!(args, vec!["mysqldump", "-ubackup", "shop"]);
    }

    #[test]
    fn dump_env_carries_password() {
        assert_eq!(dump_env(&make_cfg()), vec![("MYSQL_PWD", "hunter2".to_string())]);

        let mut cfg = make_cfg();
        cfg.db_pass.clear();
        assert!(dump_env(&cfg).is_empty());
    }

    // ── classify_dump_exit ────────────────────────────────────────────────────

    #[test]
    fn success_is_ok_regardless_of_code() {
        assert!(classify_dump_exit(true, Some(0)).is_ok());
    }

    #[test]
    fn exit_two_is_auth_failure() {
        assert!(matches!(
            classify_dump_exit(false, Some(2)),
            Err(BackupError::DumpAuth)
        ));
    }

    #[test]
    fn other_exit_codes_are_raw() {
        assert!(matches!(
            classify_dump_exit(false, Some(3)),
            Err(BackupError::DumpExit { code: Some(3) })
        ));
        assert!(matches!(
            classify_dump_exit(false, None),
            Err(BackupError::DumpExit { code: None })
        ));
    }

    // ── rclone_args ───────────────────────────────────────────────────────────

    #[test]
    fn rclone_target_joins_remote_and_dir() {
        assert_eq!(remote_target("b2", "mysql/shop"), "b2:mysql/shop");
        assert_eq!(remote_target("b2", ""), "b2:");
    }

    #[test]
    fn rclone_args_preserve_paths_with_spaces() {
        let mut cfg = make_cfg();
        cfg.backup_dir = "/mnt/my nas/dumps".into();
        let args = rclone_args(&cfg, "b2");
        assert_eq!(args[3], "/mnt/my nas/dumps");
    }

    // ── insta snapshots ───────────────────────────────────────────────────────

    #[test]
    fn snapshot_mysqldump_args() {
        insta::assert_debug_snapshot!(mysqldump_args(&make_cfg()), @r#"
        [
            "mysqldump",
            "-hdb.lan",
            "-P3306",
            "-ubackup",
            "shop",
        ]
        "#);
    }

    #[test]
    fn snapshot_rclone_args() {
        insta::assert_debug_snapshot!(rclone_args(&make_cfg(), "gdrive"), @r#"
        [
            "rclone",
            "sync",
            "-v",
            "/var/backups/mysql",
            "gdrive:mysql/shop",
        ]
        "#);
    }
}
