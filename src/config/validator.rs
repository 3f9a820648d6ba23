//! Tools file validation rules.
//!
//! Entries are checked as written, then again as tools after defaults are
//! applied:
//! - Numeric versions must be integers
//! - Names must be non-empty and unique
//! - Extraction patterns must compile
//! - URL sources need a URL
//! - GitHub sources need an `owner/repo`

use std::collections::HashSet;

use regex::Regex;

use crate::error::{Result, ToolupError};
use crate::tools::{SourceKind, Tool};

use super::schema::{ToolEntry, VersionEntry};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Tool name if error is tool-specific
    pub tool: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, tool: &Tool, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            tool: Some(tool.name.clone()),
        }
    }
}

/// Validate entries as written in the tools file.
///
/// Catches values that would silently change meaning once converted, such as
/// `version: 1.10` which YAML reads as the float `1.1`.
pub fn validate_entries(entries: &[ToolEntry]) -> Vec<ValidationError> {
    entries
        .iter()
        .filter_map(|entry| match &entry.version {
            Some(VersionEntry::Number(number)) if !(number.is_i64() || number.is_u64()) => {
                Some(ValidationError {
                    rule: "unquoted-version".to_string(),
                    message: format!(
                        "Tool '{}' has an unquoted numeric version (read as {}); quote it as a string",
                        entry.name, number
                    ),
                    tool: Some(entry.name.clone()),
                })
            }
            _ => None,
        })
        .collect()
}

/// Validate tools and return all errors.
///
/// Collects every error rather than stopping at the first, so users can fix
/// several issues at once.
pub fn validate_tools(tools: &[Tool]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, tool) in tools.iter().enumerate() {
        if tool.name.trim().is_empty() {
            errors.push(ValidationError {
                rule: "empty-name".to_string(),
                message: format!("Tool #{} has an empty name", index + 1),
                tool: None,
            });
            continue;
        }

        if !seen.insert(tool.name.as_str()) {
            errors.push(ValidationError::new(
                "duplicate-name",
                tool,
                format!("Tool '{}' is defined more than once", tool.name),
            ));
        }

        for pattern in &tool.version.patterns {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::new(
                    "invalid-pattern",
                    tool,
                    format!(
                        "Tool '{}' has an invalid pattern {:?}: {}",
                        tool.name, pattern, e
                    ),
                ));
            }
        }

        errors.extend(validate_source(tool));
    }

    errors
}

fn validate_source(tool: &Tool) -> Option<ValidationError> {
    let source = tool.source.as_ref()?;
    match source.kind {
        SourceKind::Url => {
            if source.url.as_deref().is_none_or(str::is_empty) {
                Some(ValidationError::new(
                    "missing-url",
                    tool,
                    format!("Tool '{}' uses a url source but sets no url", tool.name),
                ))
            } else {
                None
            }
        }
        SourceKind::Github => {
            let repo = source.repo.as_deref().unwrap_or(&tool.name);
            let parts: Vec<&str> = repo.split('/').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
                Some(ValidationError::new(
                    "invalid-repo",
                    tool,
                    format!(
                        "Tool '{}' needs a GitHub repository in owner/repo form, got {:?}",
                        tool.name, repo
                    ),
                ))
            } else {
                None
            }
        }
    }
}

/// Validate tools, folding all errors into one.
pub fn validate(tools: &[Tool]) -> Result<()> {
    report(validate_tools(tools))
}

/// Fold collected errors into one, or succeed when there are none.
pub fn report(errors: Vec<ValidationError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(ToolupError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SourceSpec, ToolDefaults};

    fn tool(name: &str) -> Tool {
        let mut tool = Tool::new(name);
        tool.apply_defaults(&ToolDefaults::default());
        tool
    }

    fn rules(tools: &[Tool]) -> Vec<String> {
        validate_tools(tools).into_iter().map(|e| e.rule).collect()
    }

    #[test]
    fn valid_tools_pass() {
        assert!(validate(&[tool("a/b"), tool("c/d")]).is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(rules(&[Tool::new("  ")]), ["empty-name"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let errors = validate_tools(&[tool("a/b"), tool("a/b")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "duplicate-name");
        assert_eq!(errors[0].tool.as_deref(), Some("a/b"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let mut t = tool("a/b");
        t.version.patterns = vec!["(unclosed".into()];
        assert_eq!(rules(&[t]), ["invalid-pattern"]);
    }

    #[test]
    fn url_source_requires_url() {
        let mut t = Tool::new("jq");
        t.source = Some(SourceSpec {
            kind: SourceKind::Url,
            repo: None,
            url: None,
        });
        t.apply_defaults(&ToolDefaults::default());
        assert_eq!(rules(&[t]), ["missing-url"]);
    }

    #[test]
    fn github_source_requires_owner_and_repo() {
        assert_eq!(rules(&[tool("ripgrep")]), ["invalid-repo"]);
        assert_eq!(rules(&[tool("a/b/c")]), ["invalid-repo"]);
    }

    #[test]
    fn explicit_repo_overrides_name() {
        let mut t = Tool::new("rg");
        t.source = Some(SourceSpec {
            kind: SourceKind::Github,
            repo: Some("BurntSushi/ripgrep".into()),
            url: None,
        });
        t.apply_defaults(&ToolDefaults::default());
        assert!(validate(&[t]).is_ok());
    }

    fn entry(yaml: &str) -> ToolEntry {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn fractional_numeric_version_is_rejected() {
        let errors = validate_entries(&[entry("name: a/b\nversion: 1.10")]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "unquoted-version");
        assert!(errors[0].message.contains("quote it"));
    }

    #[test]
    fn integer_and_quoted_versions_pass() {
        let entries = [
            entry("name: a/b\nversion: 14"),
            entry("name: c/d\nversion: \"1.10\""),
            entry("name: e/f"),
        ];
        assert!(validate_entries(&entries).is_empty());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut bad_pattern = tool("a/b");
        bad_pattern.version.patterns = vec!["[".into()];
        let err = validate(&[bad_pattern, tool("nope"), tool("nope")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid pattern"));
        assert!(msg.contains("owner/repo"));
        assert!(msg.contains("more than once"));
    }
}
