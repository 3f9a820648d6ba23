//! Release sources: where tool binaries come from.
//!
//! A [`ReleaseSource`] turns a configured [`Tool`] into a concrete
//! [`Artifact`] (`resolve`) and downloads it (`fetch`). Sources only deal in
//! raw executables; archives are never unpacked.
//!
//! - [`github`] - Latest or tagged GitHub releases
//! - [`url`] - A direct download URL
//! - [`http`] - The shared blocking HTTP client

pub mod github;
pub mod http;
pub mod url;

pub use github::{select_asset, Asset, GithubSource, Release, GITHUB_API_URL};
pub use http::HttpClient;
pub use url::UrlSource;

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, ToolupError};
use crate::tools::{SourceKind, Tool};

/// Resolves and downloads tool releases.
pub trait ReleaseSource: Send + Sync {
    /// Fill in the tool's target version and [`Artifact`](crate::tools::Artifact).
    fn resolve(&self, tool: &mut Tool) -> Result<()>;

    /// Download the resolved artifact into `dest` and return the file path.
    fn fetch(&self, tool: &Tool, dest: &Path) -> Result<PathBuf>;
}

/// Dispatches to the source matching each tool's [`SourceKind`].
pub struct SourceSet {
    github: GithubSource,
    url: UrlSource,
}

impl SourceSet {
    /// Create a source set from one HTTP client.
    ///
    /// Only the GitHub source sends the client's token; URL sources may
    /// point at any host.
    pub fn new(http: HttpClient) -> Self {
        Self {
            url: UrlSource::new(http.without_token()),
            github: GithubSource::new(http),
        }
    }

    /// Point the GitHub source at a different API base URL.
    pub fn with_github_api(mut self, api_url: impl Into<String>) -> Self {
        self.github = self.github.with_api_url(api_url);
        self
    }

    fn for_tool(&self, tool: &Tool) -> &dyn ReleaseSource {
        match tool.source_kind() {
            SourceKind::Github => &self.github,
            SourceKind::Url => &self.url,
        }
    }
}

impl ReleaseSource for SourceSet {
    fn resolve(&self, tool: &mut Tool) -> Result<()> {
        self.for_tool(tool).resolve(tool)
    }

    fn fetch(&self, tool: &Tool, dest: &Path) -> Result<PathBuf> {
        self.for_tool(tool).fetch(tool, dest)
    }
}

pub(crate) fn source_error(tool: &Tool, err: impl std::fmt::Display) -> ToolupError {
    ToolupError::SourceError {
        tool: tool.name.clone(),
        message: err.to_string(),
    }
}

/// Download `tool`'s resolved artifact into `dest` as the tool's executable.
///
/// When the artifact has a checksum URL the download is verified before it
/// is written. On Unix the file is made executable.
pub(crate) fn download_artifact(http: &HttpClient, tool: &Tool, dest: &Path) -> Result<PathBuf> {
    let artifact = tool
        .artifact
        .as_ref()
        .ok_or_else(|| source_error(tool, "no artifact resolved"))?;

    debug!("Downloading {} from {}", artifact.name, artifact.url);
    let bytes = http
        .get_bytes(&artifact.url)
        .map_err(|e| source_error(tool, format!("{:#}", e)))?;

    if let Some(checksum_url) = &artifact.checksum_url {
        let published = http
            .get_text(checksum_url)
            .map_err(|e| source_error(tool, format!("{:#}", e)))?;
        verify_checksum(&artifact.name, &bytes, &published)?;
        debug!("Checksum verified for {}", artifact.name);
    }

    fs::create_dir_all(dest)?;
    let path = dest.join(&tool.exe);
    fs::write(&path, &bytes)?;
    make_executable(&path)?;

    Ok(path)
}

/// Compare `bytes` against a published `sha256sum`-style line.
///
/// Only the first whitespace-separated field is used, so both a bare digest
/// and `<digest>  <file>` are accepted.
pub fn verify_checksum(asset: &str, bytes: &[u8], published: &str) -> Result<()> {
    let expected = published
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let actual = hex::encode(Sha256::digest(bytes));

    if expected != actual {
        return Err(ToolupError::Checksum {
            asset: asset.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os, Platform};
    use crate::tools::{SourceSpec, ToolDefaults};
    use httpmock::prelude::*;
    use tempfile::TempDir;

    // sha256("binary")
    const BINARY_SHA: &str = "9a3a45d01531a20e89ac6ae10b0b0beb0492acd7216a368aa062d1a5fecaf9cd";

    fn url_tool(url: String) -> Tool {
        let mut tool = Tool::new("owner/tool");
        tool.source = Some(SourceSpec {
            kind: SourceKind::Url,
            repo: None,
            url: Some(url),
        });
        tool.apply_defaults(&ToolDefaults {
            platform: Platform::new(Os::Linux, Arch::Amd64),
            ..Default::default()
        });
        tool
    }

    #[test]
    fn verify_checksum_accepts_sha256sum_format() {
        let published = format!("{}  tool-linux-amd64\n", BINARY_SHA);
        assert!(verify_checksum("tool", b"binary", &published).is_ok());
        assert!(verify_checksum("tool", b"binary", &BINARY_SHA.to_uppercase()).is_ok());
    }

    #[test]
    fn verify_checksum_rejects_mismatch() {
        let err = verify_checksum("tool", b"other", BINARY_SHA).unwrap_err();
        match err {
            ToolupError::Checksum {
                asset, expected, ..
            } => {
                assert_eq!(asset, "tool");
                assert_eq!(expected, BINARY_SHA);
            }
            other => panic!("expected checksum error, got {:?}", other),
        }
    }

    #[test]
    fn download_without_artifact_is_source_error() {
        let temp = TempDir::new().unwrap();
        let tool = url_tool("http://unused".into());
        let http = HttpClient::new().unwrap();
        let err = download_artifact(&http, &tool, temp.path()).unwrap_err();
        assert!(err.to_string().contains("no artifact resolved"));
    }

    #[test]
    fn source_set_dispatches_url_tools() {
        let server = MockServer::start();
        let download = server.mock(|when, then| {
            when.method(GET).path("/dl/tool");
            then.status(200).body("binary");
        });

        let temp = TempDir::new().unwrap();
        let sources = SourceSet::new(HttpClient::new().unwrap());
        let mut tool = url_tool(server.url("/dl/tool"));

        sources.resolve(&mut tool).unwrap();
        let path = sources.fetch(&tool, temp.path()).unwrap();

        assert_eq!(path, temp.path().join("tool"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "binary");
        download.assert();
    }

    #[test]
    fn url_sources_never_send_the_github_token() {
        let server = MockServer::start();
        let download = server.mock(|when, then| {
            when.method(GET)
                .path("/dl/tool")
                .header_missing("Authorization");
            then.status(200).body("binary");
        });

        let temp = TempDir::new().unwrap();
        let http = HttpClient::new()
            .unwrap()
            .with_token(Some("ghp_secret".into()));
        let sources = SourceSet::new(http);
        let mut tool = url_tool(server.url("/dl/tool"));

        sources.resolve(&mut tool).unwrap();
        sources.fetch(&tool, temp.path()).unwrap();
        download.assert_calls(1);
    }

    #[cfg(unix)]
    #[test]
    fn downloaded_file_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/dl/tool");
            then.status(200).body("binary");
        });

        let temp = TempDir::new().unwrap();
        let sources = SourceSet::new(HttpClient::new().unwrap());
        let mut tool = url_tool(server.url("/dl/tool"));
        sources.resolve(&mut tool).unwrap();
        let path = sources.fetch(&tool, temp.path()).unwrap();

        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
