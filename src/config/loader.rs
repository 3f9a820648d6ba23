//! Tools file loading.
//!
//! Reads a tools file, layers defaults, converts entries into [`Tool`]s,
//! and validates the result.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, ToolupError};
use crate::tools::Tool;

use super::defaults::Defaults;
use super::schema::{ToolEntry, ToolsFile};
use super::validator::{report, validate_entries, validate_tools};

/// Tools file read when none is given.
pub const DEFAULT_TOOLS_FILE: &str = "tools.yml";

/// Load a tools file from a specific path.
pub fn load_tools_file(path: &Path) -> Result<ToolsFile> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolupError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ToolupError::Io(e)
        }
    })?;

    parse_tools_file(&content, path)
}

/// Parse YAML content into a [`ToolsFile`].
///
/// Accepts a bare list of tools or a document with `defaults` and `tools`.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_tools_file(content: &str, source_path: &Path) -> Result<ToolsFile> {
    let parse_error = |e: serde_yaml::Error| ToolupError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    };

    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(parse_error)?;
    match value {
        serde_yaml::Value::Null => Ok(ToolsFile::default()),
        serde_yaml::Value::Sequence(_) => {
            let tools: Vec<ToolEntry> = serde_yaml::from_value(value).map_err(parse_error)?;
            Ok(ToolsFile {
                defaults: Defaults::default(),
                tools,
            })
        }
        _ => serde_yaml::from_value(value).map_err(parse_error),
    }
}

/// Turn a parsed file into validated tools.
///
/// `overrides` (command-line flags and environment) take precedence over the
/// file's `defaults:` section.
pub fn resolve_tools(file: ToolsFile, overrides: &Defaults) -> Result<Vec<Tool>> {
    let defaults = file.defaults.overlay(overrides).to_tool_defaults();
    debug!(
        "Defaults: output={}, strategy={}, platform={}",
        defaults.output.display(),
        defaults.strategy,
        defaults.platform
    );

    let mut errors = validate_entries(&file.tools);
    let tools: Vec<Tool> = file
        .tools
        .into_iter()
        .map(|entry| {
            let mut tool = entry.into_tool();
            tool.apply_defaults(&defaults);
            tool
        })
        .collect();

    errors.extend(validate_tools(&tools));
    report(errors)?;
    Ok(tools)
}

/// Load, resolve, and validate the tools in `path`.
pub fn load_tools(path: &Path, overrides: &Defaults) -> Result<Vec<Tool>> {
    let file = load_tools_file(path)?;
    let tools = resolve_tools(file, overrides)?;
    debug!("Loaded {} tool(s) from {}", tools.len(), path.display());
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SourceKind, UpdateStrategy};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.yml");
        let err = load_tools_file(&path).unwrap_err();
        assert!(matches!(err, ToolupError::ConfigNotFound { .. }));
    }

    #[test]
    fn parses_bare_list() {
        let file = parse_tools_file("- name: a/b\n- name: c/d\n", Path::new("t.yml")).unwrap();
        assert_eq!(file.tools.len(), 2);
        assert_eq!(file.defaults, Defaults::default());
    }

    #[test]
    fn parses_document_with_defaults() {
        let yaml = "defaults:\n  strategy: upgrade\ntools:\n  - name: a/b\n";
        let file = parse_tools_file(yaml, Path::new("t.yml")).unwrap();
        assert_eq!(file.defaults.strategy, Some(UpdateStrategy::Upgrade));
        assert_eq!(file.tools[0].name, "a/b");
    }

    #[test]
    fn empty_file_has_no_tools() {
        let file = parse_tools_file("", Path::new("t.yml")).unwrap();
        assert!(file.tools.is_empty());
    }

    #[test]
    fn parse_error_names_file() {
        let err = parse_tools_file("- name: a/b\n  strategy: later\n", Path::new("bad.yml"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.yml"));
        assert!(msg.contains("later"));
    }

    #[test]
    fn overrides_beat_file_defaults() {
        let yaml = "defaults:\n  strategy: upgrade\n  output: from-file\ntools:\n  - name: a/b\n    strategy: none\n  - name: c/d\n";
        let file = parse_tools_file(yaml, Path::new("t.yml")).unwrap();
        let overrides = Defaults {
            strategy: Some(UpdateStrategy::Force),
            ..Default::default()
        };

        let tools = resolve_tools(file, &overrides).unwrap();
        // Explicit per-tool values beat every default layer.
        assert_eq!(tools[0].strategy(), UpdateStrategy::None);
        assert_eq!(tools[1].strategy(), UpdateStrategy::Force);
        assert_eq!(tools[1].output, PathBuf::from("from-file"));
    }

    #[test]
    fn load_tools_applies_defaults_and_validates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.yml");
        fs::write(
            &path,
            "- name: BurntSushi/ripgrep\n  exe: rg\n- name: jq\n  source:\n    url: https://dl.test/jq\n",
        )
        .unwrap();

        let tools = load_tools(&path, &Defaults::default()).unwrap();
        assert_eq!(tools[0].short_name(), "ripgrep");
        assert_eq!(tools[1].source_kind(), SourceKind::Url);
        assert!(!tools[0].exe.is_empty());
    }

    #[test]
    fn unquoted_fractional_version_fails_to_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.yml");
        fs::write(&path, "- name: a/b\n  version: 1.10\n").unwrap();

        let err = load_tools(&path, &Defaults::default()).unwrap_err();
        assert!(matches!(err, ToolupError::ConfigValidationError { .. }));
        assert!(err.to_string().contains("read as 1.1"));
    }

    #[test]
    fn load_tools_reports_validation_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tools.yml");
        fs::write(&path, "- name: a/b\n- name: a/b\n").unwrap();

        let err = load_tools(&path, &Defaults::default()).unwrap_err();
        assert!(matches!(err, ToolupError::ConfigValidationError { .. }));
    }
}
