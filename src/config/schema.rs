//! Tools file schema.
//!
//! A tools file is either a plain list of tools or a document with a
//! `defaults` section and a `tools` list:
//!
//! ```yaml
//! defaults:
//!   output: ~/.local/bin
//!   strategy: upgrade
//! tools:
//!   - name: BurntSushi/ripgrep
//!     exe: rg
//!     version: "14.1.0"
//!   - name: cli/cli
//!     exe: gh
//!     version:
//!       commands: version
//!       patterns: 'gh version (\S+)'
//!     tags: [dev]
//!   - name: jqlang/jq
//!     source:
//!       type: url
//!       url: https://example.com/jq-{version}-{os}-{arch}
//!     version: "1.7.1"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::tools::{SourceKind, SourceSpec, Tool, UpdateStrategy};
use crate::version::VersionSpec;

use super::defaults::{expand_home, Defaults};

/// A parsed tools file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsFile {
    /// File-level defaults.
    #[serde(default)]
    pub defaults: Defaults,
    /// Tool entries, in file order.
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
}

/// One tool as written in the tools file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolEntry {
    /// Identity, usually `owner/repo`.
    pub name: String,
    /// Target version, either a scalar or a detailed block.
    #[serde(default)]
    pub version: Option<VersionEntry>,
    /// Install directory.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Executable name.
    #[serde(default)]
    pub exe: Option<String>,
    /// Update strategy.
    #[serde(default)]
    pub strategy: Option<UpdateStrategy>,
    /// Release source.
    #[serde(default)]
    pub source: Option<SourceEntry>,
    /// Labels for `--tags` filtering.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// `version:` as a scalar or a block with probe settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VersionEntry {
    /// `version: v1.2.3`
    Plain(String),
    /// `version: 14`. Non-integer numbers are rejected by validation since
    /// YAML reads `1.10` as the float `1.1`.
    Number(serde_yaml::Number),
    /// `version: { version: ..., commands: ..., patterns: ... }`
    Detailed(VersionDetail),
}

/// The block form of `version:`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionDetail {
    /// Target version.
    #[serde(default)]
    pub version: String,
    /// Probe commands; each string is split on whitespace into arguments.
    #[serde(default)]
    pub commands: Option<OneOrMany>,
    /// Extraction patterns.
    #[serde(default)]
    pub patterns: Option<OneOrMany>,
}

/// A single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// The non-empty strings, in order.
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        };
        items.into_iter().filter(|s| !s.trim().is_empty()).collect()
    }
}

/// `source:` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    /// `github` or `url`; inferred from `url` when omitted.
    #[serde(rename = "type", default)]
    pub kind: Option<SourceKind>,
    /// `owner/repo` for GitHub sources.
    #[serde(default)]
    pub repo: Option<String>,
    /// Download URL for URL sources.
    #[serde(default)]
    pub url: Option<String>,
}

impl From<VersionEntry> for VersionSpec {
    fn from(entry: VersionEntry) -> Self {
        match entry {
            VersionEntry::Plain(version) => VersionSpec::new(version),
            VersionEntry::Number(number) => VersionSpec::new(number.to_string()),
            VersionEntry::Detailed(detail) => VersionSpec {
                version: detail.version,
                commands: detail.commands.map(|commands| {
                    commands
                        .into_vec()
                        .iter()
                        .map(|command| command.split_whitespace().map(String::from).collect())
                        .collect()
                }),
                patterns: detail.patterns.map(OneOrMany::into_vec).unwrap_or_default(),
            },
        }
    }
}

impl From<SourceEntry> for SourceSpec {
    fn from(entry: SourceEntry) -> Self {
        let kind = entry.kind.unwrap_or(if entry.url.is_some() {
            SourceKind::Url
        } else {
            SourceKind::Github
        });
        SourceSpec {
            kind,
            repo: entry.repo,
            url: entry.url,
        }
    }
}

impl ToolEntry {
    /// Convert into a [`Tool`] with defaults not yet applied.
    pub fn into_tool(self) -> Tool {
        Tool {
            name: self.name,
            version: self.version.map(VersionSpec::from).unwrap_or_default(),
            output: self.output.as_deref().map(expand_home).unwrap_or_default(),
            exe: self.exe.unwrap_or_default(),
            strategy: self.strategy,
            source: self.source.map(SourceSpec::from),
            artifact: None,
            platform: None,
            tags: self.tags,
        }
    }
}
