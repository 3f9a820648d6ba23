//! Tools file loading, defaults, and validation.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - Layered defaults in [`defaults`]
//! - Loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use toolup::config::{load_tools, Defaults};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("tools.yml");
//! fs::write(&path, "- name: BurntSushi/ripgrep\n  exe: rg\n").unwrap();
//!
//! let tools = load_tools(&path, &Defaults::default()).unwrap();
//! assert_eq!(tools[0].name, "BurntSushi/ripgrep");
//! ```

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use defaults::Defaults;
pub use loader::{
    load_tools, load_tools_file, parse_tools_file, resolve_tools, DEFAULT_TOOLS_FILE,
};
pub use schema::{OneOrMany, SourceEntry, ToolEntry, ToolsFile, VersionDetail, VersionEntry};
pub use validator::{report, validate, validate_entries, validate_tools, ValidationError};
