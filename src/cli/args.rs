//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct. Settings that make sense to
//! fix per machine also read `TOOLUP_*` environment variables.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::warn;

use crate::config::DEFAULT_TOOLS_FILE;
use crate::error::Result;
use crate::platform::{Arch, Os};
use crate::source::{HttpClient, GITHUB_API_URL};
use crate::tools::UpdateStrategy;
use crate::updates::deferred_delete::DEFAULT_ATTEMPTS;

/// toolup - Install and update command-line tools from their releases.
#[derive(Debug, Parser)]
#[command(name = "toolup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install or update the tools listed in a tools file
    Install(InstallArgs),

    /// Ask an executable for its version
    Probe(ProbeArgs),

    /// Update toolup itself to the latest release
    #[command(visible_alias = "upgrade")]
    SelfUpdate(SelfUpdateArgs),

    /// Show the platform release assets are matched against
    Platform(PlatformArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Delete a replaced binary once it is no longer locked
    #[command(hide = true)]
    Cleanup(CleanupArgs),
}

/// Network settings shared by commands that download releases.
#[derive(Debug, Clone, clap::Args)]
pub struct NetworkArgs {
    /// GitHub token, raising API rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "TOOLUP_GITHUB_API", default_value = GITHUB_API_URL, hide = true)]
    pub github_api: String,

    /// Skip TLS certificate verification (e.g. behind an intercepting proxy)
    #[arg(long, env = "TOOLUP_NO_VERIFY_SSL")]
    pub no_verify_ssl: bool,
}

impl Default for NetworkArgs {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api: GITHUB_API_URL.to_string(),
            no_verify_ssl: false,
        }
    }
}

impl NetworkArgs {
    /// Build the HTTP client these settings describe.
    pub fn http_client(&self) -> Result<HttpClient> {
        if self.no_verify_ssl {
            warn!("TLS certificate verification is disabled");
        }
        Ok(HttpClient::with_verify_ssl(!self.no_verify_ssl)?.with_token(self.github_token.clone()))
    }
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InstallArgs {
    /// Tools file to read
    #[arg(default_value = DEFAULT_TOOLS_FILE)]
    pub file: PathBuf,

    /// Show what would be installed without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Only install tools with one of these tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Strategy for tools that do not set one
    #[arg(short, long, value_enum, env = "TOOLUP_STRATEGY")]
    pub strategy: Option<UpdateStrategy>,

    /// Directory for tools that do not set one
    #[arg(short, long, env = "TOOLUP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Tools processed at once (0 = all)
    #[arg(short = 'j', long, env = "TOOLUP_PARALLEL", default_value_t = 0)]
    pub parallel: usize,

    /// Operating system to install for
    #[arg(long, env = "TOOLUP_OS")]
    pub os: Option<Os>,

    /// Architecture to install for
    #[arg(long, env = "TOOLUP_ARCH")]
    pub arch: Option<Arch>,

    /// Seconds allowed for probing each installed tool's version
    #[arg(long, env = "TOOLUP_PROBE_TIMEOUT", default_value_t = 30)]
    pub probe_timeout: u64,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Arguments for the `probe` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ProbeArgs {
    /// Executable to probe
    pub path: PathBuf,

    /// Arguments that print the version, e.g. --command=--version (repeatable)
    #[arg(short, long = "command", allow_hyphen_values = true)]
    pub commands: Vec<String>,

    /// Regex extracting the version from the output (repeatable)
    #[arg(short, long = "pattern")]
    pub patterns: Vec<String>,

    /// Compare against this version as `upgrade` would
    #[arg(long)]
    pub target: Option<String>,

    /// Seconds allowed for all probe commands together
    #[arg(long, env = "TOOLUP_PROBE_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for the `self-update` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SelfUpdateArgs {
    /// Update strategy (`force` reinstalls the current release)
    #[arg(short, long, value_enum)]
    pub strategy: Option<UpdateStrategy>,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Arguments for the `platform` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlatformArgs {
    /// Report this operating system instead of the current one
    #[arg(long, env = "TOOLUP_OS")]
    pub os: Option<Os>,

    /// Report this architecture instead of the current one
    #[arg(long, env = "TOOLUP_ARCH")]
    pub arch: Option<Arch>,
}

/// Arguments for the hidden `cleanup` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CleanupArgs {
    /// File to delete
    #[arg(long)]
    pub target: PathBuf,

    /// Maximum removal attempts
    #[arg(long, default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// Milliseconds between attempts
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Scratch directory, removed when done
    #[arg(long)]
    pub workdir: PathBuf,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
