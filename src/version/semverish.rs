//! Extraction of semantic versions from noisy text.
//!
//! Tools report their version in every imaginable format:
//! `ripgrep 14.1.0 (rev e50df40a19)`, `go version go1.22.1 linux/amd64`,
//! `v20.11.1`. [`extract_semverish`] scans left to right and returns the first
//! substring that starts at a digit and parses as a (permissive) semantic
//! version, skipping whatever product-name noise precedes it.

use std::sync::LazyLock;

use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

/// Leading version token: `MAJOR[.MINOR[.PATCH]][-PRE][+BUILD]`, optional `v`.
static RE_LEADING_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?",
    )
    .unwrap()
});

/// No substring of the input parses as a semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no valid semver found in {input:?}")]
pub struct NoSemverFound {
    /// The string that was scanned.
    pub input: String,
}

/// A version found inside a larger string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverMatch<'a> {
    /// The parsed version.
    pub version: Version,
    /// The exact text the version was parsed from.
    pub text: &'a str,
}

/// Return the first semantic version found in `input`.
///
/// # Example
///
/// ```
/// use toolup::version::extract_semverish;
///
/// let v = extract_semverish("MyTool version 1.2.3 (build x)").unwrap();
/// assert_eq!(v.to_string(), "1.2.3");
/// assert!(extract_semverish("no digits here").is_err());
/// ```
pub fn extract_semverish(input: &str) -> Result<Version, NoSemverFound> {
    find_semverish(input).map(|m| m.version)
}

/// Like [`extract_semverish`], also returning the matched text.
pub fn find_semverish(input: &str) -> Result<SemverMatch<'_>, NoSemverFound> {
    for (offset, ch) in input.char_indices() {
        if !ch.is_ascii_digit() {
            continue;
        }
        if let Some((version, len)) = parse_leading(&input[offset..]) {
            return Ok(SemverMatch {
                version,
                text: &input[offset..offset + len],
            });
        }
    }

    Err(NoSemverFound {
        input: input.to_string(),
    })
}

/// Parse a version at the very start of `candidate`.
///
/// Returns the version and the byte length it occupied. The token must be
/// followed by the end of input or a non-alphanumeric character, so digits
/// glued to a word (`abc123def`) are not taken for a version.
pub fn parse_leading(candidate: &str) -> Option<(Version, usize)> {
    let caps = RE_LEADING_VERSION.captures(candidate)?;
    let whole = caps.get(0)?;

    if let Some(next) = candidate[whole.end()..].chars().next() {
        if next.is_ascii_alphanumeric() {
            return None;
        }
    }

    let number = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let mut version = Version::new(number(1)?, number(2)?, number(3)?);
    if let Some(pre) = caps.get(4) {
        version.pre = Prerelease::new(pre.as_str()).ok()?;
    }
    if let Some(build) = caps.get(5) {
        version.build = BuildMetadata::new(build.as_str()).ok()?;
    }

    Some((version, whole.end()))
}

/// Whether two versions are the same release.
///
/// Build metadata does not take part, matching semver precedence rules.
pub fn versions_match(a: &Version, b: &Version) -> bool {
    a.major == b.major && a.minor == b.minor && a.patch == b.patch && a.pre == b.pre
}
