//! Version probing and semver-ish extraction.
//!
//! - [`semverish`] - Pull a semantic version out of arbitrary text
//! - [`probe`] - Ask an installed executable for its version, with a timeout
//! - [`spec`] - Target version and probe configuration for a tool

pub mod probe;
pub mod semverish;
pub mod spec;

pub use probe::{extract_version, Extractor, ProbedExecutable, Prober, DEFAULT_PROBE_TIMEOUT};
pub use semverish::{extract_semverish, find_semverish, versions_match, NoSemverFound};
pub use spec::VersionSpec;
