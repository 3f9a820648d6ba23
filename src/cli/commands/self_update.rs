//! Self-update command implementation.
//!
//! The `toolup self-update` command replaces the running binary with the
//! latest GitHub release.

use tracing::info;

use crate::cli::args::SelfUpdateArgs;
use crate::error::Result;
use crate::source::GithubSource;
use crate::ui::UserInterface;
use crate::updates::{SelfUpdater, UpdateOutcome, VERSION};

use super::dispatcher::{Command, CommandResult};

/// The self-update command implementation.
pub struct SelfUpdateCommand {
    args: SelfUpdateArgs,
}

impl SelfUpdateCommand {
    /// Create a new self-update command.
    pub fn new(args: SelfUpdateArgs) -> Self {
        Self { args }
    }

    /// The running version as releases are tagged.
    pub fn running_version() -> String {
        format!("v{}", VERSION)
    }
}

impl Command for SelfUpdateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let http = self.args.network.http_client()?;
        let source = GithubSource::new(http).with_api_url(&self.args.network.github_api);

        let updater = SelfUpdater::for_current_exe(Box::new(source))?
            .with_strategy(self.args.strategy);

        let outcome = updater.update(&Self::running_version(), ui)?;
        if let UpdateOutcome::Updated { from, to } = &outcome {
            info!("Self-update complete: {} -> {}", from, to);
        }
        Ok(CommandResult::success())
    }
}
