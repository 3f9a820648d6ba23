//! Defaults for fields a tool leaves unset.
//!
//! Defaults come from three layers, later winning: built-in values, the
//! tools file's `defaults:` section, and command-line flags or their
//! environment variables.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::platform::{Arch, Os, Platform};
use crate::tools::{SourceKind, ToolDefaults, UpdateStrategy};

/// One layer of defaults; unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Install directory.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Update strategy.
    #[serde(default)]
    pub strategy: Option<UpdateStrategy>,
    /// Source kind for tools without a `source:` block.
    #[serde(default)]
    pub source: Option<SourceKind>,
    /// Operating system to install for.
    #[serde(default)]
    pub os: Option<Os>,
    /// Architecture to install for.
    #[serde(default)]
    pub arch: Option<Arch>,
}

impl Defaults {
    /// Layer `other` on top of `self`.
    pub fn overlay(&self, other: &Defaults) -> Defaults {
        Defaults {
            output: other.output.clone().or_else(|| self.output.clone()),
            strategy: other.strategy.or(self.strategy),
            source: other.source.or(self.source),
            os: other.os.or(self.os),
            arch: other.arch.or(self.arch),
        }
    }

    /// Resolve against the built-in defaults.
    pub fn to_tool_defaults(&self) -> ToolDefaults {
        let builtin = ToolDefaults::default();
        let current = Platform::current();

        ToolDefaults {
            output: self
                .output
                .as_deref()
                .map(expand_home)
                .unwrap_or(builtin.output),
            strategy: self.strategy.unwrap_or(builtin.strategy),
            platform: Platform::new(
                self.os.unwrap_or(current.os),
                self.arch.unwrap_or(current.arch),
            ),
            source: self.source.unwrap_or(builtin.source),
        }
    }
}

/// Replace a leading `~` with the user's home directory.
///
/// Paths without a leading `~`, and all paths when no home directory is
/// known, are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
