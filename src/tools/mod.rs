//! Tools, update strategies, and install decisions.
//!
//! - [`tool`] - The [`Tool`] model and the install-state query
//! - [`strategy`] - [`UpdateStrategy`] and the [`decide`] engine
//! - [`batch`] - Evaluating many tools with bounded parallelism

pub mod batch;
pub mod strategy;
pub mod tool;

pub use batch::evaluate_all;
pub use strategy::{decide, CompareError, Decision, InstalledVersion, UpdateStrategy};
pub use tool::{Artifact, SourceKind, SourceSpec, Tool, ToolDefaults};
