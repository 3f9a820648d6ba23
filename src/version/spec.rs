//! Desired version of a tool and how to ask an installed copy for its own.

use super::probe::DEFAULT_COMMANDS;

/// Target version plus the commands and patterns used to probe for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSpec {
    /// Target version, e.g. `v14.1.0`. Empty means "latest" to a source.
    pub version: String,
    /// Candidate argument lists, tried in order.
    ///
    /// `None` uses [`DEFAULT_COMMANDS`]. `Some(vec![])` means the tool cannot
    /// report its version, so it is always considered out of date.
    pub commands: Option<Vec<Vec<String>>>,
    /// Regex patterns applied to command output, tried in order.
    pub patterns: Vec<String>,
}

impl VersionSpec {
    /// A spec targeting `version` with default probing.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Whether the installed executable can be asked for its version at all.
    pub fn is_probeable(&self) -> bool {
        !matches!(&self.commands, Some(commands) if commands.is_empty())
    }

    /// The argument lists a prober should try.
    pub fn candidate_commands(&self) -> Vec<Vec<String>> {
        match &self.commands {
            Some(commands) => commands.clone(),
            None => DEFAULT_COMMANDS
                .iter()
                .map(|arg| vec![arg.to_string()])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_commands_use_defaults() {
        let spec = VersionSpec::new("1.0.0");
        let candidates = spec.candidate_commands();
        assert_eq!(candidates.len(), DEFAULT_COMMANDS.len());
        assert_eq!(candidates[0], vec!["--version".to_string()]);
        assert!(spec.is_probeable());
    }

    #[test]
    fn empty_commands_are_not_probeable() {
        let spec = VersionSpec {
            commands: Some(vec![]),
            ..Default::default()
        };
        assert!(!spec.is_probeable());
        assert!(spec.candidate_commands().is_empty());
    }

    #[test]
    fn explicit_commands_replace_defaults() {
        let spec = VersionSpec {
            commands: Some(vec![vec!["version".into(), "--short".into()]]),
            ..Default::default()
        };
        assert_eq!(
            spec.candidate_commands(),
            vec![vec!["version".to_string(), "--short".to_string()]]
        );
    }
}
