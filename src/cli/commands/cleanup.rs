//! The hidden `cleanup` command.
//!
//! Spawned detached by a Windows update to delete the previous binary once
//! its process has exited. Nobody reads its output; progress goes to the
//! plan's log file.

use std::time::Duration;

use tracing::debug;

use crate::cli::args::CleanupArgs;
use crate::error::Result;
use crate::ui::UserInterface;
use crate::updates::CleanupPlan;

use super::dispatcher::{Command, CommandResult};

/// The cleanup command implementation.
pub struct CleanupCommand {
    args: CleanupArgs,
}

impl CleanupCommand {
    /// Create a new cleanup command.
    pub fn new(args: CleanupArgs) -> Self {
        Self { args }
    }

    fn plan(&self) -> CleanupPlan {
        CleanupPlan::new(&self.args.target, &self.args.workdir)
            .with_attempts(self.args.attempts)
            .with_interval(Duration::from_millis(self.args.interval_ms))
    }
}

impl Command for CleanupCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = self.plan().run();
        debug!(
            "Cleanup of {} after {} attempt(s): deleted={}",
            self.args.target.display(),
            report.attempts,
            report.deleted
        );

        Ok(if report.deleted {
            CommandResult::success()
        } else {
            CommandResult::failure(1)
        })
    }
}
