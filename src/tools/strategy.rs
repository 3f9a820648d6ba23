//! Update strategies and the install/skip decision.
//!
//! A tool's [`UpdateStrategy`] decides whether an existing installation
//! blocks a new one. [`decide`] evaluates the strategy against what is on
//! disk and returns exactly one [`Decision`]:
//!
//! | Strategy  | Not installed | Installed                                    |
//! |-----------|---------------|----------------------------------------------|
//! | `none`    | `Proceed`     | `AlreadyExists`                              |
//! | `upgrade` | `Proceed`     | `UpToDate` if versions match, else `Proceed` |
//! | `force`   | `Proceed`     | `Proceed`                                    |
//!
//! When the installed version cannot be determined, `upgrade` proceeds:
//! reinstalling needlessly is preferable to leaving a stale binary behind.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::{extract_semverish, versions_match, NoSemverFound};

/// How an existing installation affects a new install.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Never touch an existing installation.
    #[default]
    None,
    /// Reinstall when the installed version differs from the target.
    Upgrade,
    /// Always reinstall.
    Force,
}

impl UpdateStrategy {
    /// Cheap check that needs no version information.
    ///
    /// Returns [`Decision::AlreadyExists`] for `none` on an existing tool so
    /// callers can skip resolving remote versions entirely.
    pub fn precheck(&self, exists: bool) -> Option<Decision> {
        if *self == UpdateStrategy::None && exists {
            Some(Decision::AlreadyExists)
        } else {
            None
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateStrategy::None => "none",
            UpdateStrategy::Upgrade => "upgrade",
            UpdateStrategy::Force => "force",
        };
        f.write_str(name)
    }
}

/// What is known about the installed executable's version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledVersion {
    /// The tool is configured with no version commands.
    Unprobeable,
    /// Probing ran but produced no version.
    Unresolved,
    /// The version text the executable reported.
    Reported(String),
}

/// A version string could not be compared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing version {raw:?}: {source}: {current:?} -> {target:?}")]
pub struct CompareError {
    /// The string that failed to parse.
    pub raw: String,
    /// Installed version as reported.
    pub current: String,
    /// Target version as configured.
    pub target: String,
    #[source]
    pub source: NoSemverFound,
}

/// The outcome of evaluating a tool against its strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Install (or reinstall) the tool.
    Proceed,
    /// Tool exists and the strategy forbids touching it.
    AlreadyExists,
    /// Installed version matches the target.
    UpToDate { current: String, target: String },
    /// Versions could not be compared.
    Error(CompareError),
}

impl Decision {
    /// Whether the tool should be installed.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Decision::Proceed)
    }

    /// Whether nothing needs doing (already exists or up to date).
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Decision::AlreadyExists | Decision::UpToDate { .. })
    }

    /// Whether the decision is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Decision::Error(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Proceed => f.write_str("needs install"),
            Decision::AlreadyExists => f.write_str("already exists"),
            Decision::UpToDate { current, target } => write!(
                f,
                "up to date: current version {:?} and target version {:?} match",
                current, target
            ),
            Decision::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Decide whether a tool needs installing.
///
/// `installed` is only consulted for [`UpdateStrategy::Upgrade`] on an
/// existing tool; callers may pass anything otherwise.
pub fn decide(
    strategy: UpdateStrategy,
    exists: bool,
    installed: InstalledVersion,
    target: &str,
) -> Decision {
    if let Some(decision) = strategy.precheck(exists) {
        return decision;
    }

    if !exists {
        return Decision::Proceed;
    }

    match strategy {
        UpdateStrategy::None => Decision::AlreadyExists,
        UpdateStrategy::Upgrade => compare_installed(installed, target),
        UpdateStrategy::Force => Decision::Proceed,
    }
}

fn compare_installed(installed: InstalledVersion, target: &str) -> Decision {
    let current = match installed {
        InstalledVersion::Unprobeable | InstalledVersion::Unresolved => {
            return Decision::Proceed;
        }
        InstalledVersion::Reported(current) => current,
    };

    let parse = |raw: &str| {
        extract_semverish(raw).map_err(|source| CompareError {
            raw: raw.to_string(),
            current: current.clone(),
            target: target.to_string(),
            source,
        })
    };

    let installed_version = match parse(&current) {
        Ok(v) => v,
        Err(e) => return Decision::Error(e),
    };
    let target_version = match parse(target) {
        Ok(v) => v,
        Err(e) => return Decision::Error(e),
    };

    if versions_match(&installed_version, &target_version) {
        Decision::UpToDate {
            current,
            target: target.to_string(),
        }
    } else {
        Decision::Proceed
    }
}
