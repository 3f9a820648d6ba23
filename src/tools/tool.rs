//! The tool model: what to install, where, and under which policy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::Platform;
use crate::version::{Prober, VersionSpec};

use super::strategy::{decide, Decision, InstalledVersion, UpdateStrategy};

/// Where a tool's releases come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// GitHub releases of `owner/repo`.
    #[default]
    Github,
    /// A direct download URL.
    Url,
}

/// Source descriptor for a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    /// Kind of source.
    pub kind: SourceKind,
    /// `owner/repo`; defaults to the tool name.
    pub repo: Option<String>,
    /// Direct download URL for [`SourceKind::Url`].
    pub url: Option<String>,
}

/// A concrete downloadable file picked by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name of the release asset.
    pub name: String,
    /// Where to download it from.
    pub url: String,
    /// A published SHA-256 checksum file for the asset, if any.
    pub checksum_url: Option<String>,
}

/// Defaults applied to fields a tool leaves unset.
#[derive(Debug, Clone)]
pub struct ToolDefaults {
    /// Directory tools are installed into.
    pub output: PathBuf,
    /// Strategy for tools that do not set one.
    pub strategy: UpdateStrategy,
    /// Platform to install for.
    pub platform: Platform,
    /// Source kind for tools that do not set one.
    pub source: SourceKind,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            output: PathBuf::from("bin"),
            strategy: UpdateStrategy::None,
            platform: Platform::current(),
            source: SourceKind::Github,
        }
    }
}

/// A named executable with a desired version and update policy.
#[derive(Debug, Clone, Default)]
pub struct Tool {
    /// Identity, usually `owner/repo`.
    pub name: String,
    /// Target version and probe configuration.
    pub version: VersionSpec,
    /// Directory the executable is installed into.
    pub output: PathBuf,
    /// Executable file name, including any OS extension.
    pub exe: String,
    /// Update policy; `None` until defaults are applied.
    pub strategy: Option<UpdateStrategy>,
    /// Source descriptor; kind `None` until defaults are applied.
    pub source: Option<SourceSpec>,
    /// Download location, filled in by a source's `resolve`.
    pub artifact: Option<Artifact>,
    /// Platform to install for; `None` until defaults are applied.
    pub platform: Option<Platform>,
    /// Free-form labels for filtering.
    pub tags: Vec<String>,
}

impl Tool {
    /// A tool with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fill unset fields from `defaults`.
    pub fn apply_defaults(&mut self, defaults: &ToolDefaults) {
        let platform = *self.platform.get_or_insert(defaults.platform);

        if self.output.as_os_str().is_empty() {
            self.output = defaults.output.clone();
        }
        if self.exe.is_empty() {
            self.exe = platform.exe_name(self.short_name());
        } else {
            self.exe = platform.exe_name(&self.exe);
        }
        if self.strategy.is_none() {
            self.strategy = Some(defaults.strategy);
        }
        let source = self.source.get_or_insert_with(|| SourceSpec {
            kind: defaults.source,
            ..Default::default()
        });
        if source.kind == SourceKind::Github && source.repo.is_none() {
            source.repo = Some(self.name.clone());
        }
    }

    /// Last path segment of the name: `BurntSushi/ripgrep` → `ripgrep`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Full path of the installed executable.
    pub fn path(&self) -> PathBuf {
        self.output.join(&self.exe)
    }

    /// Whether the executable is already installed.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// The effective strategy.
    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy.unwrap_or_default()
    }

    /// The effective platform.
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }

    /// The effective source kind.
    pub fn source_kind(&self) -> SourceKind {
        self.source.as_ref().map(|s| s.kind).unwrap_or_default()
    }

    /// Decide whether this tool needs installing.
    ///
    /// The installed executable is only probed for `upgrade` on an existing
    /// tool that has probe commands.
    pub fn check(&self, prober: &Prober) -> Decision {
        self.check_at(&self.path(), prober)
    }

    /// Like [`check`](Self::check), probing the executable at `path`.
    pub fn check_at(&self, path: &Path, prober: &Prober) -> Decision {
        let exists = path.is_file();
        let strategy = self.strategy();

        let installed = if strategy == UpdateStrategy::Upgrade && exists {
            if self.version.is_probeable() {
                let probed = prober.probe(path, &self.version);
                match probed.version() {
                    Some(v) => InstalledVersion::Reported(v.to_string()),
                    None => InstalledVersion::Unresolved,
                }
            } else {
                InstalledVersion::Unprobeable
            }
        } else {
            InstalledVersion::Unresolved
        };

        let decision = decide(strategy, exists, installed, &self.version.version);
        debug!("{}: {} ({})", self.name, decision, strategy);
        decision
    }

    /// Whether the tool carries any of `tags`; an empty filter matches all.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }
}
