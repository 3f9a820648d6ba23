//! GitHub releases.
//!
//! Resolves `owner/repo` to the latest release (or the release tagged with
//! the tool's configured version) and picks the asset built for the target
//! platform.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;
use crate::tools::{Artifact, Tool};

use super::http::HttpClient;
use super::{download_artifact, source_error, ReleaseSource};

/// Public GitHub API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Asset names ending in these are never executables.
const EXCLUDED_SUFFIXES: &[&str] = &[
    ".tar.gz", ".tgz", ".tar.xz", ".txz", ".tar.bz2", ".tbz", ".zip", ".7z", ".gz", ".xz",
    ".bz2", ".zst", ".deb", ".rpm", ".apk", ".msi", ".pkg", ".dmg", ".sha256", ".sha512",
    ".sha256sum", ".sig", ".asc", ".pem", ".sbom", ".json", ".txt",
];

/// A GitHub release, as returned by the releases API.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// Release source backed by the GitHub releases API.
#[derive(Debug, Clone)]
pub struct GithubSource {
    http: HttpClient,
    api_url: String,
}

impl GithubSource {
    /// Create a source talking to the public GitHub API.
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            api_url: GITHUB_API_URL.to_string(),
        }
    }

    /// Use a different API base URL (GitHub Enterprise, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API URL of the release to install for `repo`.
    ///
    /// An empty or `latest` version means the latest release; anything else
    /// is taken as a tag name.
    pub fn release_url(&self, repo: &str, version: &str) -> String {
        match version {
            "" | "latest" => format!("{}/repos/{}/releases/latest", self.api_url, repo),
            tag => format!("{}/repos/{}/releases/tags/{}", self.api_url, repo, tag),
        }
    }
}

impl ReleaseSource for GithubSource {
    fn resolve(&self, tool: &mut Tool) -> Result<()> {
        let repo = tool
            .source
            .as_ref()
            .and_then(|s| s.repo.clone())
            .unwrap_or_else(|| tool.name.clone());
        if !repo.contains('/') {
            return Err(source_error(
                tool,
                format!("repository {:?} is not in owner/repo form", repo),
            ));
        }

        let url = self.release_url(&repo, &tool.version.version);
        debug!("Resolving {} via {}", tool.name, url);
        let release: Release = self
            .http
            .get_json(&url)
            .map_err(|e| source_error(tool, format!("{:#}", e)))?;

        let platform = tool.platform();
        let asset = select_asset(&release.assets, &platform).ok_or_else(|| {
            source_error(
                tool,
                format!(
                    "release {} has no executable asset for {}",
                    release.tag_name, platform
                ),
            )
        })?;

        let checksum_name = format!("{}.sha256", asset.name);
        let checksum_url = release
            .assets
            .iter()
            .find(|a| a.name == checksum_name)
            .map(|a| a.browser_download_url.clone());

        debug!("{}: picked {} from {}", tool.name, asset.name, release.tag_name);
        tool.artifact = Some(Artifact {
            name: asset.name.clone(),
            url: asset.browser_download_url.clone(),
            checksum_url,
        });
        tool.version.version = release.tag_name;

        Ok(())
    }

    fn fetch(&self, tool: &Tool, dest: &Path) -> Result<PathBuf> {
        download_artifact(&self.http, tool, dest)
    }
}

/// Pick the asset built for `platform`.
///
/// An asset qualifies when its name carries an OS alias and an architecture
/// alias as separate words and it is not an archive, package, or checksum.
/// Among qualifying assets one naming the platform's C library wins;
/// otherwise the first qualifies.
pub fn select_asset<'a>(assets: &'a [Asset], platform: &Platform) -> Option<&'a Asset> {
    let candidates: Vec<(&Asset, Vec<String>)> = assets
        .iter()
        .filter(|a| !is_excluded(&a.name))
        .map(|a| (a, name_tokens(&a.name)))
        .filter(|(_, tokens)| {
            has_any(tokens, platform.os.aliases()) && has_any(tokens, platform.arch.aliases())
        })
        .collect();

    if let Some(library) = platform.library.alias() {
        if let Some((asset, _)) = candidates
            .iter()
            .find(|(_, tokens)| tokens.iter().any(|t| t == library))
        {
            return Some(asset);
        }
    }

    candidates.first().map(|(asset, _)| *asset)
}

fn is_excluded(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXCLUDED_SUFFIXES.iter().any(|ext| lower.ends_with(ext)) || lower.contains("checksums")
}

fn name_tokens(name: &str) -> Vec<String> {
    let lower = name
        .to_lowercase()
        .replace("x86_64", "amd64")
        .replace("x86-64", "amd64");
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn has_any(tokens: &[String], aliases: &[&str]) -> bool {
    tokens.iter().any(|t| aliases.contains(&t.as_str()))
}
