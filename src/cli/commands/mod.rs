//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`toolup install`, `toolup probe`)
//! - Shared initialization logic
//! - Consistent global flag handling

pub mod cleanup;
pub mod completions;
pub mod dispatcher;
pub mod install;
pub mod platform;
pub mod probe;
pub mod self_update;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use install::{install_one, InstallOutcome};
