//! Self-update and safe binary replacement.
//!
//! This module provides:
//! - [`SelfUpdater`] to replace the running toolup binary
//! - [`ReplaceStrategy`] implementations for platforms that do and do not
//!   lock running executables
//! - [`CleanupPlan`] for deleting the previous binary after exit

pub mod deferred_delete;
pub mod replace;
pub mod session;
pub mod updater;

pub use deferred_delete::{schedule_delete, CleanupPlan, CleanupReport};
pub use replace::{for_os, for_os_with_helper, RenameOver, ReplaceStrategy, Replacement, SwapAside};
pub use session::SelfUpdateSession;
pub use updater::{repository, SelfUpdater, UpdateOutcome, FALLBACK_REPO, VERSION};
