//! Direct download URLs.
//!
//! The configured URL is the artifact. It may reference `{version}`, `{os}`,
//! `{arch}` and `{exe}`, which are filled in from the tool before download.
//! The target version stays whatever the tools file says.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::tools::{Artifact, Tool};

use super::http::HttpClient;
use super::{download_artifact, source_error, ReleaseSource};

/// Release source for tools with a fixed download URL.
#[derive(Debug, Clone)]
pub struct UrlSource {
    http: HttpClient,
}

impl UrlSource {
    /// Create a URL source.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl ReleaseSource for UrlSource {
    fn resolve(&self, tool: &mut Tool) -> Result<()> {
        let template = tool
            .source
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .ok_or_else(|| source_error(tool, "url source has no url"))?;

        let url = expand_url(template, tool);
        let name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|n| !n.is_empty())
            .unwrap_or(&tool.exe)
            .to_string();

        tool.artifact = Some(Artifact {
            name,
            url,
            checksum_url: None,
        });
        Ok(())
    }

    fn fetch(&self, tool: &Tool, dest: &Path) -> Result<PathBuf> {
        download_artifact(&self.http, tool, dest)
    }
}

/// Substitute tool placeholders in a URL template.
pub fn expand_url(template: &str, tool: &Tool) -> String {
    let platform = tool.platform();
    template
        .replace("{version}", &tool.version.version)
        .replace("{os}", &platform.os.to_string())
        .replace("{arch}", &platform.arch.to_string())
        .replace("{exe}", &tool.exe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, Platform};
    use crate::tools::{SourceKind, SourceSpec, ToolDefaults};
    use crate::version::VersionSpec;

    fn tool_with_url(url: Option<&str>) -> Tool {
        let mut tool = Tool::new("owner/tool");
        tool.version = VersionSpec::new("1.4.0");
        tool.source = Some(SourceSpec {
            kind: SourceKind::Url,
            repo: None,
            url: url.map(String::from),
        });
        tool.apply_defaults(&ToolDefaults {
            platform: Platform::new(Os::Linux, Arch::Arm64),
            ..Default::default()
        });
        tool
    }

    #[test]
    fn expands_placeholders() {
        let tool = tool_with_url(None);
        assert_eq!(
            expand_url("https://dl.test/{version}/{exe}-{os}-{arch}", &tool),
            "https://dl.test/1.4.0/tool-linux-arm64"
        );
    }

    #[test]
    fn resolve_sets_artifact_and_keeps_version() {
        let source = UrlSource::new(HttpClient::new().unwrap());
        let mut tool = tool_with_url(Some("https://dl.test/v{version}/tool-{arch}?raw=1"));
        source.resolve(&mut tool).unwrap();

        let artifact = tool.artifact.unwrap();
        assert_eq!(artifact.url, "https://dl.test/v1.4.0/tool-arm64?raw=1");
        assert_eq!(artifact.name, "tool-arm64");
        assert_eq!(tool.version.version, "1.4.0");
    }

    #[test]
    fn resolve_without_url_is_error() {
        let source = UrlSource::new(HttpClient::new().unwrap());
        let mut tool = tool_with_url(None);
        let err = source.resolve(&mut tool).unwrap_err();
        assert!(err.to_string().contains("url source has no url"));
    }
}
