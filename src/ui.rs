//! Terminal UI and process execution: spinners, stage lines, child processes.
//!
//! Two execution styles are needed:
//!
//! - **Piped** ([`PipedChild`]): stdout is handed to the caller as a stream and stderr is drained on a
//!   helper thread.  Used for the dump, whose stdout is the SQL payload.
//! - **Inherited** ([`run_inherited`]): the child writes straight to our terminal.  Used for rclone so
//!   its own progress output reaches the operator.
//!
//! Both block until the child exits.  There is no timeout: a hung tool hangs
//! the invocation.

use std::{
    io::Read,
    process::{Child, ChildStdout, Command, Stdio},
    thread::JoinHandle,
    time::Duration,
};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::error::{BackupError, BackupResult};

// ─── Icons ───────────────────────────────────────────────────────────────────

/// Braille spinner frames, same style as indicatif's default.
static SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn icon_ok() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}
fn icon_err() -> console::StyledObject<&'static str> {
    style("✗").red().bold()
}
fn icon_skip() -> console::StyledObject<&'static str> {
    style("–").dim()
}
fn icon_done() -> console::StyledObject<&'static str> {
    style("✓").cyan().bold()
}

// ─── Stage result ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Ok,
    Failed,
    Skipped,
}

/// The outcome of a single step (the dump, or one remote sync).
#[derive(Debug)]
pub struct StageOutcome {
    /// Human-readable label, e.g. `"Dump shop"` or `"Sync b2"`.
    pub label: String,
    pub status: StageStatus,
    /// Captured stderr, replayed on failure.  Empty for inherited runs.
    pub stderr: String,
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn ok(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: StageStatus::Ok,
            stderr: String::new(),
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, err: &BackupError, stderr: String) -> Self {
        Self {
            label: label.into(),
            status: StageStatus::Failed,
            stderr,
            error: Some(err.to_string()),
        }
    }

    /// A step that was never attempted because an earlier one failed.
    pub fn skipped(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: StageStatus::Skipped,
            stderr: String::new(),
            error: None,
        }
    }

    /// Print the one-line ✓/✗ summary, plus error and stderr on failure.
    pub fn print(&self) {
        match self.status {
            StageStatus::Ok => println!("  {}  {}", icon_ok(), style(&self.label).bold()),
            StageStatus::Skipped => {
                println!("  {}  {}", icon_skip(), style(&self.label).dim());
            },
            StageStatus::Failed => {
                println!("  {}  {}", icon_err(), style(&self.label).bold());

                if let Some(ref msg) = self.error {
                    eprintln!();
                    eprintln!("  {} {}", style("Error:").red().bold(), msg);
                }
                if !self.stderr.is_empty() {
                    eprintln!();
                    eprintln!("  {} stderr:", style("►").dim());
                    for line in self.stderr.lines() {
                        eprintln!("    {line}");
                    }
                }
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }
}

// ─── Spinner ──────────────────────────────────────────────────────────────────

/// Create and start an indeterminate spinner for `label`.
pub fn make_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    // The template is a literal; fall back to the default style if it is
    // ever rejected.
    let spinner_style = ProgressStyle::with_template("  {spinner:.cyan}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(SPINNER_CHARS);
    pb.set_style(spinner_style);
    pb.set_message(format!("{}", style(label).dim()));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ─── Execution ────────────────────────────────────────────────────────────────

/// How a child process ended.
#[derive(Debug)]
pub struct Finished {
    pub success: bool,
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

fn build_command(args: &[String], env: &[(&str, String)]) -> BackupResult<(String, Command)> {
    let (prog, rest) = args.split_first().ok_or_else(|| BackupError::Spawn {
        program: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;
    let mut cmd = Command::new(prog);
    cmd.args(rest);
    for (k, v) in env {
        cmd.env(k, v);
    }
    Ok((prog.clone(), cmd))
}

/// A running child whose stdout is exposed to the caller and whose stderr is
/// collected in the background.
pub struct PipedChild {
    program: String,
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl PipedChild {
    /// Spawn `args` with piped stdout and stderr.
    pub fn spawn(args: &[String], env: &[(&str, String)]) -> BackupResult<Self> {
        let (program, mut cmd) = build_command(args, env)?;
        debug!(program = %program, args = ?&args[1..], "spawning");

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackupError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Drain stderr concurrently, otherwise a chatty child can fill the
        // pipe and block while we are still reading stdout.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                if let Err(e) = pipe.read_to_end(&mut buf) {
                    warn!(error = %e, "failed to read child stderr");
                }
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        Ok(Self {
            program,
            child,
            stderr,
        })
    }

    /// Take the stdout stream.  Returns `None` on the second call.
    pub fn stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Wait for the child to exit and collect its stderr.
    pub fn wait(mut self) -> BackupResult<Finished> {
        // Drop any unread stdout so the child sees EPIPE instead of blocking.
        drop(self.child.stdout.take());

        let status = self.child.wait().map_err(|source| BackupError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let stderr = self
            .stderr
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        debug!(program = %self.program, code = ?status.code(), "child exited");
        Ok(Finished {
            success: status.success(),
            code: status.code(),
            stderr,
        })
    }
}

/// Run `args` with stdout and stderr inherited from this process.
pub fn run_inherited(args: &[String]) -> BackupResult<Finished> {
    let (program, mut cmd) = build_command(args, &[])?;
    debug!(program = %program, args = ?&args[1..], "spawning with inherited stdio");

    let status = cmd.status().map_err(|source| BackupError::Spawn {
        program: program.clone(),
        source,
    })?;

    debug!(program = %program, code = ?status.code(), "child exited");
    Ok(Finished {
        success: status.success(),
        code: status.code(),
        stderr: String::new(),
    })
}

// ─── Summary banner ───────────────────────────────────────────────────────────

/// Print the final banner: `done_msg` when nothing failed, otherwise the list
/// of failed stages.
pub fn print_summary(outcomes: &[StageOutcome], done_msg: &str) {
    let failed: Vec<&StageOutcome> = outcomes.iter().filter(|o| o.is_failed()).collect();
    println!();
    if failed.is_empty() {
        println!("  {} {}", icon_done(), style(done_msg).cyan().bold());
    } else {
        eprintln!("  {}  {}", icon_err(), style("Failed.").red().bold());
        for o in &failed {
            eprintln!("    {} {}", icon_err(), style(&o.label).red());
        }
    }
    println!();
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    // ── StageOutcome ──────────────────────────────────────────────────────────

    #[test]
    fn ok_outcome_is_not_failed() {
        assert!(!StageOutcome::ok("Dump").is_failed());
    }

    #[test]
    fn skipped_outcome_is_not_failed() {
        let o = StageOutcome::skipped("Sync c");
        assert!(!o.is_failed());
        assert_eq!(o.status, StageStatus::Skipped);
    }

    #[test]
    fn failed_outcome_keeps_message_and_stderr() {
        let o = StageOutcome::failed("Dump", &BackupError::DumpAuth, "denied".into());
        assert!(o.is_failed());
        assert_eq!(o.stderr, "denied");
        assert!(o.error.unwrap().contains("authentication"));
    }

    // ── PipedChild ────────────────────────────────────────────────────────────

    #[test]
    fn piped_child_streams_stdout() {
        let mut child = PipedChild::spawn(&sh("echo 'SELECT 1;'"), &[]).unwrap();
        let mut out = String::new();
        child.stdout().unwrap().read_to_string(&mut out).unwrap();
        let done = child.wait().unwrap();
        assert!(done.success);
        assert_eq!(out, "SELECT 1;\n");
    }

    #[test]
    fn piped_child_keeps_stderr_separate() {
        let mut child = PipedChild::spawn(&sh("echo data; echo warning >&2"), &[]).unwrap();
        let mut out = String::new();
        child.stdout().unwrap().read_to_string(&mut out).unwrap();
        let done = child.wait().unwrap();
        assert_eq!(out, "data\n");
        assert!(done.stderr.contains("warning"));
    }

    #[test]
    fn piped_child_reports_exit_code() {
        let child = PipedChild::spawn(&sh("exit 2"), &[]).unwrap();
        let done = child.wait().unwrap();
        assert!(!done.success);
        assert_eq!(done.code, Some(2));
    }

    #[test]
    fn piped_child_passes_env() {
        let env = [("DBSYNC_TEST_VAR", "secret".to_string())];
        let mut child = PipedChild::spawn(&sh("printf %s \"$DBSYNC_TEST_VAR\""), &env).unwrap();
        let mut out = String::new();
        child.stdout().unwrap().read_to_string(&mut out).unwrap();
        child.wait().unwrap();
        assert_eq!(out, "secret");
    }

    #[test]
    fn spawn_missing_program_is_spawn_error() {
        let err = PipedChild::spawn(&["dbsync-no-such-program-xyz".into()], &[])
            .err()
            .unwrap();
        assert!(matches!(err, BackupError::Spawn { .. }));
    }

    #[test]
    fn empty_command_errors() {
        assert!(PipedChild::spawn(&[], &[]).is_err());
        assert!(run_inherited(&[]).is_err());
    }

    // ── run_inherited ─────────────────────────────────────────────────────────

    #[test]
    fn run_inherited_true_succeeds() {
        assert!(run_inherited(&["true".into()]).unwrap().success);
    }

    #[test]
    fn run_inherited_reports_exit_code() {
        let done = run_inherited(&sh("exit 7")).unwrap();
        assert!(!done.success);
        assert_eq!(done.code, Some(7));
    }

    // ── print_summary ─────────────────────────────────────────────────────────

    #[test]
    fn summary_smoke() {
        print_summary(&[StageOutcome::ok("Sync a")], "done");
        print_summary(
            &[
                StageOutcome::ok("Sync a"),
                StageOutcome::failed("Sync b", &BackupError::DumpExit { code: Some(1) }, String::new()),
                StageOutcome::skipped("Sync c"),
            ],
            "done",
        );
    }
}
