//! Install command implementation.
//!
//! The `toolup install` command reads a tools file and installs or updates
//! every selected tool according to its strategy.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cli::args::InstallArgs;
use crate::config::{load_tools, Defaults};
use crate::error::{Result, ToolupError};
use crate::platform::Os;
use crate::source::{ReleaseSource, SourceSet};
use crate::tools::{evaluate_all, Decision, Tool};
use crate::ui::UserInterface;
use crate::updates::{for_os, for_os_with_helper, ReplaceStrategy};
use crate::version::Prober;

use super::dispatcher::{Command, CommandResult};

/// What happened to one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Downloaded from `url` and placed at `path`.
    Installed {
        version: String,
        url: String,
        path: PathBuf,
    },
    /// Dry run: would be downloaded from `url`.
    WouldInstall { version: String, url: String },
    /// Left alone.
    Skipped(Decision),
    /// Could not be installed.
    Failed(String),
}

impl InstallOutcome {
    /// Whether this outcome should fail the run.
    pub fn is_failure(&self) -> bool {
        matches!(self, InstallOutcome::Failed(_))
    }
}

/// Install a single tool.
///
/// A `none` strategy on an existing tool is settled before any network
/// access. Otherwise the release is resolved first so that `upgrade`
/// compares against the concrete target version.
pub fn install_one(
    tool: &Tool,
    source: &dyn ReleaseSource,
    prober: &Prober,
    replacer: &dyn ReplaceStrategy,
    dry_run: bool,
) -> InstallOutcome {
    if let Some(decision) = tool.strategy().precheck(tool.exists()) {
        return InstallOutcome::Skipped(decision);
    }

    let mut tool = tool.clone();
    if let Err(e) = source.resolve(&mut tool) {
        return InstallOutcome::Failed(e.to_string());
    }

    match tool.check(prober) {
        Decision::Proceed => {}
        Decision::Error(e) => return InstallOutcome::Failed(e.to_string()),
        other => return InstallOutcome::Skipped(other),
    }

    let version = tool.version.version.clone();
    let url = tool
        .artifact
        .as_ref()
        .map(|a| a.url.clone())
        .unwrap_or_default();
    if dry_run {
        return InstallOutcome::WouldInstall { version, url };
    }

    match place(&tool, source, replacer) {
        Ok(path) => InstallOutcome::Installed { version, url, path },
        Err(e) => InstallOutcome::Failed(e.to_string()),
    }
}

/// Download into a staging directory beside the target, then swap it in.
fn place(tool: &Tool, source: &dyn ReleaseSource, replacer: &dyn ReplaceStrategy) -> Result<PathBuf> {
    fs::create_dir_all(&tool.output)?;
    let staging = tempfile::Builder::new()
        .prefix(".toolup-")
        .tempdir_in(&tool.output)?;

    let downloaded = source.fetch(tool, staging.path())?;
    let target = tool.path();
    let replacement = replacer.replace(&downloaded, &target)?;

    if let Err(e) = replacer.finalize(&replacement) {
        warn!("Cleanup after installing {} failed: {}", tool.name, e);
    }
    Ok(target)
}

/// The install command implementation.
pub struct InstallCommand {
    args: InstallArgs,
}

impl InstallCommand {
    /// Create a new install command.
    pub fn new(args: InstallArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &InstallArgs {
        &self.args
    }

    /// Defaults given on the command line or through the environment.
    pub fn overrides(&self) -> Defaults {
        Defaults {
            output: self.args.output.clone(),
            strategy: self.args.strategy,
            source: None,
            os: self.args.os,
            arch: self.args.arch,
        }
    }

    fn sources(&self) -> Result<SourceSet> {
        let http = self.args.network.http_client()?;
        Ok(SourceSet::new(http).with_github_api(&self.args.network.github_api))
    }

    fn replacer() -> Box<dyn ReplaceStrategy> {
        match std::env::current_exe() {
            Ok(helper) => for_os_with_helper(Os::current(), &helper),
            Err(_) => for_os(Os::current()),
        }
    }

    /// Run against a specific source and replacement strategy.
    pub fn run_with(
        &self,
        ui: &mut dyn UserInterface,
        source: &dyn ReleaseSource,
        replacer: &dyn ReplaceStrategy,
    ) -> Result<CommandResult> {
        let tools = match load_tools(&self.args.file, &self.overrides()) {
            Ok(tools) => tools,
            Err(ToolupError::ConfigNotFound { path }) => {
                ui.error(&format!("No tools file found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        let selected: Vec<Tool> = tools
            .into_iter()
            .filter(|t| t.matches_tags(&self.args.tags))
            .collect();

        if selected.is_empty() {
            ui.warning("No tools to install");
            return Ok(CommandResult::success());
        }

        if self.args.dry_run {
            ui.message("Running in dry-run mode - nothing will be downloaded");
        }

        let prober = Prober::new().with_timeout(Duration::from_secs(self.args.probe_timeout));
        let dry_run = self.args.dry_run;

        let label = if selected.len() == 1 { "tool" } else { "tools" };
        let mut spinner = ui.start_spinner(&format!("Checking {} {}", selected.len(), label));
        let outcomes = evaluate_all(&selected, self.args.parallel, |tool| {
            install_one(tool, source, &prober, replacer, dry_run)
        });
        spinner.finish_success(&format!("Checked {} {}", selected.len(), label));

        let detail = ui.output_mode().shows_detail();
        let mut installed = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for (tool, outcome) in selected.iter().zip(&outcomes) {
            debug!("{}: {:?}", tool.name, outcome);
            match outcome {
                InstallOutcome::Installed { version, url, path } => {
                    installed += 1;
                    ui.success(&format!(
                        "{} {} installed to {}",
                        tool.name,
                        version,
                        path.display()
                    ));
                    if detail {
                        ui.message(&format!("  downloaded from {}", url));
                    }
                }
                InstallOutcome::WouldInstall { version, url } => {
                    installed += 1;
                    ui.message(&format!("{} {} would be installed from {}", tool.name, version, url));
                }
                InstallOutcome::Skipped(decision) => {
                    skipped += 1;
                    ui.skipped(&format!("{}: {}", tool.name, decision));
                    if detail {
                        ui.message(&format!(
                            "  {} ({} strategy)",
                            tool.path().display(),
                            tool.strategy()
                        ));
                    }
                }
                InstallOutcome::Failed(message) => {
                    failed += 1;
                    ui.error(&format!("{}: {}", tool.name, message));
                }
            }
        }

        let summary = format!(
            "{} installed, {} skipped, {} failed",
            installed, skipped, failed
        );
        if failed == 0 {
            ui.success(&summary);
            Ok(CommandResult::success())
        } else {
            ui.error(&summary);
            Ok(CommandResult::failure(1))
        }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let sources = self.sources()?;
        let replacer = Self::replacer();
        self.run_with(ui, &sources, replacer.as_ref())
    }
}
