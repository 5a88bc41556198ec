//! `dbsync sync <path>`: mirror the backup directory to each rclone remote.
//!
//! Remotes are processed strictly in the order listed in `RCLONEREMOTES`.
//! rclone's own progress output goes straight to the terminal.  The first
//! failing remote stops the run; later remotes are reported as skipped and
//! never invoked.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    config::{Config, Key},
    error::{BackupError, BackupResult},
    runner::rclone_args,
    ui::{Finished, StageOutcome, print_summary, run_inherited},
};

// ─── Entry point ──────────────────────────────────────────────────────────────

pub fn run(cfg: &Config) -> BackupResult<()> {
    let remotes = validate(cfg)?;
    let backup_dir = cfg.backup_dir();
    if !has_backups(&backup_dir) {
        warn!(
            dir = %backup_dir.display(),
            "backup directory is empty or missing; rclone sync will empty the remotes"
        );
    }

    let outcomes = sync_all(&remotes, |remote| {
        println!();
        println!("  ► Sync {remote}");
        run_inherited(&rclone_args(cfg, remote))
    });

    for o in &outcomes.stages {
        o.print();
    }
    print_summary(
        &outcomes.stages,
        &format!("rclone completed for: {}", backup_dir.display()),
    );

    outcomes.result
}

/// Remote list, or a configuration error before anything is spawned.
pub fn validate(cfg: &Config) -> BackupResult<Vec<&str>> {
    cfg.require(Key::BackupDir)?;
    let remotes = cfg.remotes();
    if remotes.is_empty() {
        return Err(BackupError::MissingValue {
            key: Key::RcloneRemotes.name(),
        });
    }
    Ok(remotes)
}

// ─── Loop ─────────────────────────────────────────────────────────────────────

/// Per-remote outcomes plus the overall result.
#[derive(Debug)]
pub struct SyncOutcomes {
    pub stages: Vec<StageOutcome>,
    pub result: BackupResult<()>,
}

/// Call `sync_one` for each remote in order, stopping at the first failure.
///
/// Remotes after the failing one are recorded as skipped without calling
/// `sync_one`.
pub fn sync_all<F>(remotes: &[&str], mut sync_one: F) -> SyncOutcomes
where
    F: FnMut(&str) -> BackupResult<Finished>,
{
    let mut stages = Vec::with_capacity(remotes.len());
    let mut result = Ok(());

    for (i, &remote) in remotes.iter().enumerate() {
        let label = format!("Sync {remote}");
        let err = match sync_one(remote) {
            Ok(done) if done.success => {
                info!(remote, "sync finished");
                stages.push(StageOutcome::ok(label));
                continue;
            },
            Ok(done) => BackupError::SyncFailed {
                remote: remote.to_string(),
                code: done.code,
            },
            Err(e) => e,
        };

        stages.push(StageOutcome::failed(label, &err, String::new()));
        stages.extend(
            remotes[i + 1..]
                .iter()
                .map(|r| StageOutcome::skipped(format!("Sync {r}"))),
        );
        result = Err(err);
        break;
    }

    SyncOutcomes { stages, result }
}

/// Whether `dir` has at least one entry.  Mirroring an empty directory
/// deletes everything at the destination.
pub fn has_backups(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
