//! Error types for toolup operations.
//!
//! This module defines [`ToolupError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `ToolupError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `ToolupError::Other`) for unexpected errors
//! - Version comparison failures are not errors here; they surface as
//!   [`Decision::Error`](crate::tools::Decision) so one tool cannot fail a batch

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of a self-update at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    /// Locating the running executable.
    Locate,
    /// Resolving the latest release.
    Resolve,
    /// Creating the session directory.
    Prepare,
    /// Downloading the replacement binary.
    Fetch,
    /// Swapping the replacement into place.
    Replace,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            UpdateStage::Locate => "locating the current executable",
            UpdateStage::Resolve => "resolving the latest release",
            UpdateStage::Prepare => "preparing a temporary directory",
            UpdateStage::Fetch => "downloading the new binary",
            UpdateStage::Replace => "replacing the current binary",
        };
        f.write_str(stage)
    }
}

/// Core error type for toolup operations.
#[derive(Debug, Error)]
pub enum ToolupError {
    /// Tools file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the tools file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A release source could not resolve or fetch a tool.
    #[error("Source error for '{tool}': {message}")]
    SourceError { tool: String, message: String },

    /// A downloaded artifact did not match its published checksum.
    #[error("Checksum mismatch for {asset}: expected {expected}, got {actual}")]
    Checksum {
        asset: String,
        expected: String,
        actual: String,
    },

    /// Self-update failed; the installed binary was left untouched.
    #[error("Self-update failed while {stage}: {source}")]
    SelfUpdate {
        stage: UpdateStage,
        #[source]
        source: Box<ToolupError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ToolupError {
    /// Wrap an error with the self-update stage it occurred in.
    pub fn at_stage(stage: UpdateStage) -> impl FnOnce(ToolupError) -> ToolupError {
        move |source| ToolupError::SelfUpdate {
            stage,
            source: Box::new(source),
        }
    }
}

/// Result type alias for toolup operations.
pub type Result<T> = std::result::Result<T, ToolupError>;
