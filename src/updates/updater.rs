//! Replacing the running toolup binary with the latest release.
//!
//! The update treats toolup like any other tool: a transient [`Tool`] is
//! resolved through a [`ReleaseSource`], downloaded into a
//! [`SelfUpdateSession`], and swapped in by the platform's
//! [`ReplaceStrategy`]. Any failure before the swap completes leaves the
//! installed binary untouched.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Result, ToolupError, UpdateStage};
use crate::platform::Platform;
use crate::source::ReleaseSource;
use crate::tools::{SourceKind, SourceSpec, Tool, ToolDefaults, UpdateStrategy};
use crate::ui::UserInterface;
use crate::version::VersionSpec;

use super::replace::{for_os, ReplaceStrategy};
use super::session::SelfUpdateSession;

/// Current version of toolup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repository used when the build did not record one.
pub const FALLBACK_REPO: &str = "toolup-dev/toolup";

const NAME: &str = env!("CARGO_PKG_NAME");

/// `owner/repo` toolup updates itself from.
pub fn repository() -> String {
    option_env!("CARGO_PKG_REPOSITORY")
        .and_then(|url| url.strip_prefix("https://github.com/"))
        .map(|repo| repo.trim_end_matches('/').trim_end_matches(".git"))
        .filter(|repo| repo.contains('/'))
        .unwrap_or(FALLBACK_REPO)
        .to_string()
}

/// How a self-update ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The running version already matches the latest release.
    UpToDate { version: String },
    /// The binary was replaced.
    Updated { from: String, to: String },
}

/// Updates the running executable in place.
pub struct SelfUpdater {
    source: Box<dyn ReleaseSource>,
    exe: PathBuf,
    platform: Platform,
    replacer: Box<dyn ReplaceStrategy>,
    repo: String,
    strategy: UpdateStrategy,
}

impl SelfUpdater {
    /// Update the executable at `exe` from `source`.
    pub fn new(source: Box<dyn ReleaseSource>, exe: impl Into<PathBuf>) -> Self {
        let platform = Platform::current();
        Self {
            source,
            exe: exe.into(),
            platform,
            replacer: for_os(platform.os),
            repo: repository(),
            strategy: UpdateStrategy::Upgrade,
        }
    }

    /// Update the currently running executable.
    pub fn for_current_exe(source: Box<dyn ReleaseSource>) -> Result<Self> {
        let exe = env::current_exe()
            .map_err(ToolupError::from)
            .map_err(ToolupError::at_stage(UpdateStage::Locate))?;
        Ok(Self::new(source, exe))
    }

    /// Set the strategy; unset and `none` both mean `upgrade`, since an
    /// existing binary is a given here.
    pub fn with_strategy(mut self, strategy: Option<UpdateStrategy>) -> Self {
        self.strategy = match strategy {
            None | Some(UpdateStrategy::None) => UpdateStrategy::Upgrade,
            Some(strategy) => strategy,
        };
        self
    }

    /// Target a different platform (and its replacement strategy).
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self.replacer = for_os(platform.os);
        self
    }

    /// Override the replacement strategy.
    pub fn with_replacer(mut self, replacer: Box<dyn ReplaceStrategy>) -> Self {
        self.replacer = replacer;
        self
    }

    /// Update from a different repository.
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    /// The effective strategy.
    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// The executable being updated.
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    fn tool(&self) -> Tool {
        let mut tool = Tool::new(self.repo.clone());
        tool.version = VersionSpec::new("");
        tool.strategy = Some(self.strategy);
        tool.source = Some(SourceSpec {
            kind: SourceKind::Github,
            repo: Some(self.repo.clone()),
            url: None,
        });
        if let Some(name) = self.exe.file_name() {
            tool.exe = name.to_string_lossy().into_owned();
        }
        if let Some(dir) = self.exe.parent() {
            tool.output = dir.to_path_buf();
        }
        tool.apply_defaults(&ToolDefaults {
            strategy: self.strategy,
            platform: self.platform,
            source: SourceKind::Github,
            ..Default::default()
        });
        tool
    }

    /// Run the update, reporting progress to `ui`.
    ///
    /// The release tag is compared to `running_version` as plain text.
    pub fn update(
        &self,
        running_version: &str,
        ui: &mut dyn UserInterface,
    ) -> Result<UpdateOutcome> {
        let mut tool = self.tool();
        self.source
            .resolve(&mut tool)
            .map_err(ToolupError::at_stage(UpdateStage::Resolve))?;
        let target = tool.version.version.clone();

        if target == running_version {
            if self.strategy != UpdateStrategy::Force {
                ui.success(&format!(
                    "{} ({}) is already up-to-date",
                    NAME, running_version
                ));
                return Ok(UpdateOutcome::UpToDate { version: target });
            }
            ui.message("Forcing update...");
        }

        ui.message(&format!(
            "Update requested from {:?} -> {:?}",
            running_version, target
        ));

        let session =
            SelfUpdateSession::create(running_version, &self.repo, &self.exe, self.platform.os)
                .map_err(ToolupError::at_stage(UpdateStage::Prepare))?;

        let mut spinner = ui.start_spinner(&format!("Downloading {} {}", NAME, target));
        let downloaded = match self.source.fetch(&tool, session.dir()) {
            Ok(path) => {
                spinner.finish_success(&format!("Downloaded {} {}", NAME, target));
                path
            }
            Err(e) => {
                spinner.finish_error(&format!("Download of {} {} failed", NAME, target));
                return Err(ToolupError::at_stage(UpdateStage::Fetch)(e));
            }
        };

        let replacement = self
            .replacer
            .replace(&downloaded, &session.exe)
            .map_err(ToolupError::at_stage(UpdateStage::Replace))?;
        info!(
            "Replaced {} ({} -> {})",
            session.exe.display(),
            session.running_version,
            target
        );

        if let Err(e) = self.replacer.finalize(&replacement) {
            warn!("Cleanup after update failed: {}", e);
        }
        drop(session);

        ui.success(&format!("{} updated successfully", NAME));
        Ok(UpdateOutcome::Updated {
            from: running_version.to_string(),
            to: target,
        })
    }
}
