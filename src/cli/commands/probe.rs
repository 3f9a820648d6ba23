//! Probe command implementation.
//!
//! The `toolup probe` command asks one executable for its version, the same
//! way `install` does for tools under the `upgrade` strategy.

use std::time::Duration;

use crate::cli::args::ProbeArgs;
use crate::error::Result;
use crate::tools::{decide, Decision, InstalledVersion, UpdateStrategy};
use crate::ui::UserInterface;
use crate::version::{Prober, VersionSpec};

use super::dispatcher::{Command, CommandResult};

/// The probe command implementation.
pub struct ProbeCommand {
    args: ProbeArgs,
}

impl ProbeCommand {
    /// Create a new probe command.
    pub fn new(args: ProbeArgs) -> Self {
        Self { args }
    }

    /// Build the probe configuration from the arguments.
    ///
    /// Each `--command` is split on whitespace into one argument list.
    pub fn version_spec(&self) -> VersionSpec {
        let commands: Vec<Vec<String>> = self
            .args
            .commands
            .iter()
            .map(|c| c.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|c| !c.is_empty())
            .collect();

        VersionSpec {
            version: self.args.target.clone().unwrap_or_default(),
            commands: if commands.is_empty() {
                None
            } else {
                Some(commands)
            },
            patterns: self.args.patterns.clone(),
        }
    }
}

impl Command for ProbeCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if !self.args.path.is_file() {
            ui.error(&format!("Executable not found: {}", self.args.path.display()));
            return Ok(CommandResult::failure(1));
        }
        // A bare file name would otherwise be looked up on PATH.
        let path = &std::fs::canonicalize(&self.args.path)?;

        let spec = self.version_spec();
        let prober = Prober::new().with_timeout(Duration::from_secs(self.args.timeout));
        let probed = prober.probe(path, &spec);

        let Some(version) = probed.version() else {
            ui.error(&format!("Could not determine the version of {}", path.display()));
            return Ok(CommandResult::failure(1));
        };
        ui.message(version);

        let Some(target) = &self.args.target else {
            return Ok(CommandResult::success());
        };

        let decision = decide(
            UpdateStrategy::Upgrade,
            true,
            InstalledVersion::Reported(version.to_string()),
            target,
        );
        match &decision {
            Decision::Error(_) => {
                ui.error(&decision.to_string());
                Ok(CommandResult::failure(1))
            }
            Decision::Proceed => {
                ui.warning(&format!("{} differs from target {}", version, target));
                Ok(CommandResult::success())
            }
            _ => {
                ui.success(&decision.to_string());
                Ok(CommandResult::success())
            }
        }
    }
}
