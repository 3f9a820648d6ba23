//! toolup - Install and update command-line tools from their releases.
//!
//! toolup reads a list of tools, asks each installed executable for its
//! version, decides per tool whether to install, and downloads what is
//! missing or outdated. It can also replace its own binary in place.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Tools file loading, defaults, and validation
//! - [`error`] - Error types and result aliases
//! - [`platform`] - Operating system and architecture identity
//! - [`source`] - Release sources (GitHub releases, direct URLs)
//! - [`tools`] - The tool model and install decisions
//! - [`ui`] - Spinners and terminal output
//! - [`updates`] - Self-update, binary replacement, deferred deletion
//! - [`version`] - Version probing and semver-ish extraction
//!
//! # Example
//!
//! ```
//! use toolup::tools::{decide, Decision, InstalledVersion, UpdateStrategy};
//! use toolup::version::extract_semverish;
//!
//! let v = extract_semverish("ripgrep 14.1.0 (rev e50df40a19)").unwrap();
//! assert_eq!(v.to_string(), "14.1.0");
//!
//! let decision = decide(
//!     UpdateStrategy::Upgrade,
//!     true,
//!     InstalledVersion::Reported("14.1.0".into()),
//!     "v14.1.0",
//! );
//! assert!(matches!(decision, Decision::UpToDate { .. }));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod source;
pub mod tools;
pub mod ui;
pub mod updates;
pub mod version;

pub use error::{Result, ToolupError};
