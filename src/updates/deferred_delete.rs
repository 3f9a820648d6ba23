//! Deleting a file that cannot be removed yet.
//!
//! On Windows the previous executable stays locked until the process that
//! ran the update exits. [`CleanupPlan::schedule`] hands the deletion to a
//! detached helper (the new binary, via the hidden `cleanup` subcommand),
//! which retries [`CleanupPlan::run`] until the lock is gone.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, info};

use crate::error::Result;

/// Removal attempts before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Pause between removal attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Log file written inside the helper's working directory.
pub const LOG_FILE: &str = "cleanup.log";

#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A pending deletion and how hard to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPlan {
    /// File to delete.
    pub target: PathBuf,
    /// Maximum removal attempts.
    pub attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
    /// Scratch directory holding the log; removed when the helper finishes.
    pub workdir: PathBuf,
}

/// What a cleanup run achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    /// Whether the target is gone.
    pub deleted: bool,
    /// Attempts made.
    pub attempts: u32,
}

impl CleanupPlan {
    /// A plan with the default retry budget.
    pub fn new(target: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            attempts: DEFAULT_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            workdir: workdir.into(),
        }
    }

    /// Set the maximum number of attempts (at least one).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Set the pause between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Path of the helper's log file.
    pub fn log_file(&self) -> PathBuf {
        self.workdir.join(LOG_FILE)
    }

    /// Command-line arguments that reproduce this plan in the helper.
    pub fn helper_args(&self) -> Vec<OsString> {
        vec![
            "cleanup".into(),
            "--target".into(),
            self.target.clone().into_os_string(),
            "--attempts".into(),
            self.attempts.to_string().into(),
            "--interval-ms".into(),
            self.interval.as_millis().to_string().into(),
            "--workdir".into(),
            self.workdir.clone().into_os_string(),
        ]
    }

    /// Spawn `helper_exe cleanup ...` detached and return immediately.
    pub fn schedule(&self, helper_exe: &Path) -> Result<()> {
        let mut command = Command::new(helper_exe);
        command
            .args(self.helper_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(DETACHED_PROCESS | CREATE_NO_WINDOW);
        }

        let child = command.spawn()?;
        info!(
            "Scheduled deletion of {} (helper pid {})",
            self.target.display(),
            child.id()
        );
        Ok(())
    }

    /// Retry deleting the target, logging each attempt, then remove the
    /// working directory.
    ///
    /// Never fails: the outcome is reported, not raised.
    pub fn run(&self) -> CleanupReport {
        let log_path = self.log_file();
        let mut report = CleanupReport {
            deleted: false,
            attempts: 0,
        };

        for attempt in 1..=self.attempts {
            report.attempts = attempt;
            clear_readonly(&self.target);

            match fs::remove_file(&self.target) {
                Ok(()) => {
                    append_log(&log_path, &format!("attempt {}: deleted", attempt));
                    report.deleted = true;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    append_log(&log_path, &format!("attempt {}: already gone", attempt));
                    report.deleted = true;
                    break;
                }
                Err(e) => {
                    append_log(&log_path, &format!("attempt {}: {}", attempt, e));
                    if attempt < self.attempts {
                        thread::sleep(self.interval);
                    }
                }
            }
        }

        if !report.deleted {
            append_log(
                &log_path,
                &format!("giving up on {}", self.target.display()),
            );
        }

        if let Err(e) = fs::remove_dir_all(&self.workdir) {
            debug!("Could not remove {}: {}", self.workdir.display(), e);
        }
        report
    }
}

/// Create a scratch directory and schedule deletion of `target` through
/// `helper_exe`.
pub fn schedule_delete(target: &Path, helper_exe: &Path) -> Result<CleanupPlan> {
    let workdir = tempfile::Builder::new()
        .prefix("toolup-cleanup-")
        .tempdir()?
        .keep();
    let plan = CleanupPlan::new(target, workdir);
    plan.schedule(helper_exe)?;
    Ok(plan)
}

fn clear_readonly(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            let _ = fs::set_permissions(path, permissions);
        }
    }
}

/// Append a timestamped line to the log, ignoring failures.
pub(crate) fn append_log(path: &Path, line: &str) {
    let file = OpenOptions::new().create(true).append(true).open(path);
    if let Ok(mut file) = file {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {}", stamp, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plan_in(temp: &TempDir, target: &Path) -> CleanupPlan {
        let workdir = temp.path().join("work");
        fs::create_dir_all(&workdir).unwrap();
        CleanupPlan::new(target, workdir).with_interval(Duration::ZERO)
    }

    #[test]
    fn defaults_match_retry_budget() {
        let plan = CleanupPlan::new("/tmp/old", "/tmp/work");
        assert_eq!(plan.attempts, 10);
        assert_eq!(plan.interval, Duration::from_secs(1));
        assert_eq!(plan.log_file(), PathBuf::from("/tmp/work/cleanup.log"));
    }

    #[test]
    fn attempts_are_at_least_one() {
        let plan = CleanupPlan::new("a", "b").with_attempts(0);
        assert_eq!(plan.attempts, 1);
    }

    #[test]
    fn helper_args_round_trip_plan() {
        let plan = CleanupPlan::new("/bin/.toolup.old", "/tmp/w")
            .with_attempts(3)
            .with_interval(Duration::from_millis(250));
        let args: Vec<String> = plan
            .helper_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "cleanup",
                "--target",
                "/bin/.toolup.old",
                "--attempts",
                "3",
                "--interval-ms",
                "250",
                "--workdir",
                "/tmp/w"
            ]
        );
    }

    #[test]
    fn run_deletes_target_and_workdir() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join(".tool.old");
        fs::write(&target, "old").unwrap();
        let plan = plan_in(&temp, &target);

        let report = plan.run();

        assert_eq!(
            report,
            CleanupReport {
                deleted: true,
                attempts: 1
            }
        );
        assert!(!target.exists());
        assert!(!plan.workdir.exists());
    }

    #[test]
    fn run_deletes_readonly_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join(".tool.old");
        fs::write(&target, "old").unwrap();
        let mut permissions = fs::metadata(&target).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&target, permissions).unwrap();

        let report = plan_in(&temp, &target).run();
        assert!(report.deleted);
        assert!(!target.exists());
    }

    #[test]
    fn run_on_missing_target_counts_as_deleted() {
        let temp = TempDir::new().unwrap();
        let report = plan_in(&temp, &temp.path().join("missing")).run();
        assert!(report.deleted);
        assert_eq!(report.attempts, 1);
    }

    #[test]
    fn run_gives_up_after_attempts() {
        let temp = TempDir::new().unwrap();
        // remove_file cannot delete a directory.
        let target = temp.path().join("locked");
        fs::create_dir(&target).unwrap();

        let plan = plan_in(&temp, &target).with_attempts(3);
        let report = plan.run();

        assert_eq!(
            report,
            CleanupReport {
                deleted: false,
                attempts: 3
            }
        );
        assert!(target.exists());
        assert!(!plan.workdir.exists());
    }

    #[test]
    fn append_log_writes_timestamped_lines() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join(LOG_FILE);
        append_log(&log, "attempt 1: denied");
        append_log(&log, "attempt 2: deleted");

        let content = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[1].ends_with("attempt 2: deleted"));
    }

    #[cfg(unix)]
    #[test]
    fn schedule_spawns_helper() {
        let temp = TempDir::new().unwrap();
        let plan = plan_in(&temp, &temp.path().join("old"));
        assert!(plan.schedule(Path::new("/bin/true")).is_ok());
    }

    #[test]
    fn schedule_with_missing_helper_fails() {
        let temp = TempDir::new().unwrap();
        let plan = plan_in(&temp, &temp.path().join("old"));
        assert!(plan.schedule(&temp.path().join("no-such-helper")).is_err());
    }
}
