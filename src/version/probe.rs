//! Probing installed executables for their self-reported version.
//!
//! A [`Prober`] runs candidate argument lists (`--version`, `-v`, ...) against
//! an executable, one after another, under a single shared time budget. The
//! first candidate whose combined output yields a version wins.
//!
//! Probing never fails: an executable that cannot be started, hangs, or
//! prints nothing recognisable produces an unresolved [`ProbedExecutable`],
//! and the decision engine treats that as "needs update".
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use toolup::version::{Prober, VersionSpec};
//!
//! let prober = Prober::new().with_timeout(Duration::from_secs(5));
//! let probed = prober.probe(Path::new("/usr/local/bin/rg"), &VersionSpec::default());
//! match probed.version() {
//!     Some(v) => println!("rg reports {}", v),
//!     None => println!("could not determine rg version"),
//! }
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};

use super::semverish::find_semverish;
use super::spec::VersionSpec;

/// Total time all candidate commands may take together.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Candidate arguments tried when a tool does not configure its own.
pub const DEFAULT_COMMANDS: &[&str] = &["--version", "-v", "-version", "version"];

/// How often a running candidate is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An executable path and the version it reported, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedExecutable {
    /// The executable that was probed.
    pub path: PathBuf,
    /// Extracted version text; empty when unresolved.
    pub version: String,
}

impl ProbedExecutable {
    /// An unresolved probe of `path`.
    pub fn unresolved(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            version: String::new(),
        }
    }

    /// Whether a version was extracted.
    pub fn is_resolved(&self) -> bool {
        !self.version.is_empty()
    }

    /// The extracted version, if any.
    pub fn version(&self) -> Option<&str> {
        if self.is_resolved() {
            Some(&self.version)
        } else {
            None
        }
    }
}

/// Outcome of running one candidate command.
#[derive(Debug)]
enum Candidate {
    /// The process ran to completion (any exit code).
    Output(String),
    /// The process could not be started or waited on.
    Failed,
    /// The shared budget ran out while the process was running.
    TimedOut,
}

/// Runs version commands against executables.
#[derive(Debug, Clone)]
pub struct Prober {
    timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl Prober {
    /// Create a prober with the default 30 second budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total time budget shared by all candidates.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `path` for its version using the candidates in `spec`.
    pub fn probe(&self, path: &Path, spec: &VersionSpec) -> ProbedExecutable {
        let candidates = spec.candidate_commands();
        if candidates.is_empty() {
            debug!("No version commands configured for {}", path.display());
            return ProbedExecutable::unresolved(path);
        }

        let extractor = Extractor::new(&spec.patterns);
        let deadline = Instant::now() + self.timeout;

        for args in &candidates {
            let now = Instant::now();
            if now >= deadline {
                debug!("Probe budget exhausted for {}", path.display());
                break;
            }

            match run_candidate(path, args, deadline) {
                Candidate::Output(output) => {
                    if let Some(version) = extractor.extract(&output) {
                        debug!(
                            "{} {:?} reported version {}",
                            path.display(),
                            args,
                            version
                        );
                        return ProbedExecutable {
                            path: path.to_path_buf(),
                            version,
                        };
                    }
                    debug!("{} {:?} printed no recognisable version", path.display(), args);
                }
                Candidate::Failed => {}
                Candidate::TimedOut => {
                    debug!("{} {:?} timed out", path.display(), args);
                }
            }
        }

        ProbedExecutable::unresolved(path)
    }
}

/// How versions are found in command output.
///
/// Explicit patterns take precedence: the first pattern that matches wins,
/// using its first capture group when it has one. Without patterns the
/// semver-ish scan is used and the matched text returned verbatim.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Scan for the first semver-ish token.
    Semverish,
    /// Try compiled patterns in order; never falls back to the scan.
    Patterns(Vec<Regex>),
}

impl Extractor {
    /// Compile `patterns` once. Invalid patterns are logged and skipped.
    pub fn new(patterns: &[String]) -> Self {
        if patterns.is_empty() {
            return Extractor::Semverish;
        }

        let compiled = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping invalid version pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();
        Extractor::Patterns(compiled)
    }

    /// Extract a version from `output`.
    pub fn extract(&self, output: &str) -> Option<String> {
        let patterns = match self {
            Extractor::Semverish => {
                return find_semverish(output).ok().map(|m| m.text.to_string());
            }
            Extractor::Patterns(patterns) => patterns,
        };

        patterns.iter().find_map(|re| {
            let caps = re.captures(output)?;
            let text = caps.get(1).or_else(|| caps.get(0))?.as_str().trim();
            (!text.is_empty()).then(|| text.to_string())
        })
    }
}

/// Extract a version from command output with one-off patterns.
pub fn extract_version(output: &str, patterns: &[String]) -> Option<String> {
    Extractor::new(patterns).extract(output)
}

/// Run one candidate, capturing stdout and stderr, until `deadline`.
fn run_candidate(path: &Path, args: &[String], deadline: Instant) -> Candidate {
    let mut child = match Command::new(path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            debug!("Failed to start {} {:?}: {}", path.display(), args, e);
            return Candidate::Failed;
        }
    };

    // Readers are detached: a grandchild may keep a pipe open after the
    // child itself is gone, and that must not stall the probe.
    let (tx, rx) = mpsc::channel();
    spawn_reader(child.stdout.take(), 0, tx.clone());
    spawn_reader(child.stderr.take(), 1, tx);

    match wait_until(&mut child, deadline) {
        Ok(Some(status)) => {
            debug!("{} {:?} exited with {}", path.display(), args, status);
        }
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Candidate::TimedOut;
        }
        Err(e) => {
            debug!("Failed waiting on {}: {}", path.display(), e);
            let _ = child.kill();
            let _ = child.wait();
            return Candidate::Failed;
        }
    }

    let mut streams = [Vec::new(), Vec::new()];
    for _ in 0..2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining.max(POLL_INTERVAL)) {
            Ok((idx, bytes)) => streams[idx] = bytes,
            Err(_) => break,
        }
    }

    let stdout = String::from_utf8_lossy(&streams[0]);
    let stderr = String::from_utf8_lossy(&streams[1]);
    let combined = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
        (false, true) => stdout.trim().to_string(),
        (true, _) => stderr.trim().to_string(),
    };

    Candidate::Output(combined)
}

fn spawn_reader<R>(pipe: Option<R>, idx: usize, tx: mpsc::Sender<(usize, Vec<u8>)>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send((idx, buf));
    });
}

/// Poll `child` until it exits or `deadline` passes.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_version_uses_semverish_without_patterns() {
        let v = extract_version("mytool version 1.2.3 (abc)", &[]);
        assert_eq!(v.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn extract_version_returns_none_for_noise() {
        assert!(extract_version("usage: mytool [flags]", &[]).is_none());
    }

    #[test]
    fn extract_version_prefers_capture_group() {
        let patterns = vec![r"release (\S+)".to_string()];
        let v = extract_version("build 20240101 release 3.4.5", &patterns);
        assert_eq!(v.as_deref(), Some("3.4.5"));
    }

    #[test]
    fn extract_version_uses_whole_match_without_group() {
        let patterns = vec![r"\d+\.\d+".to_string()];
        let v = extract_version("version 7.1 stable", &patterns);
        assert_eq!(v.as_deref(), Some("7.1"));
    }

    #[test]
    fn extract_version_tries_patterns_in_order() {
        let patterns = vec![r"nomatch (\S+)".to_string(), r"rev (\S+)".to_string()];
        let v = extract_version("tool rev 9.9.9", &patterns);
        assert_eq!(v.as_deref(), Some("9.9.9"));
    }

    #[test]
    fn explicit_patterns_do_not_fall_back() {
        let patterns = vec![r"release (\S+)".to_string()];
        assert!(extract_version("tool 1.2.3", &patterns).is_none());
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let patterns = vec!["(unclosed".to_string(), r"v(\S+)".to_string()];
        let v = extract_version("tool v1.0.0", &patterns);
        assert_eq!(v.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn extractor_compiles_valid_patterns_once() {
        let patterns = vec!["(unclosed".to_string(), r"v(\S+)".to_string()];
        let extractor = Extractor::new(&patterns);
        match &extractor {
            Extractor::Patterns(compiled) => assert_eq!(compiled.len(), 1),
            Extractor::Semverish => panic!("patterns were given"),
        }
        assert_eq!(extractor.extract("tool v1.0.0").as_deref(), Some("1.0.0"));
        assert_eq!(extractor.extract("other v2.0.0").as_deref(), Some("2.0.0"));
    }

    #[test]
    fn all_invalid_patterns_do_not_fall_back() {
        let extractor = Extractor::new(&["[".to_string()]);
        assert!(extractor.extract("tool 1.2.3").is_none());
    }

    #[test]
    fn missing_executable_is_unresolved() {
        let prober = Prober::new().with_timeout(Duration::from_secs(2));
        let probed = prober.probe(
            Path::new("/nonexistent/path/to/tool"),
            &VersionSpec::default(),
        );
        assert!(!probed.is_resolved());
        assert!(probed.version().is_none());
    }

    #[test]
    fn empty_commands_are_unresolved_without_spawning() {
        let spec = VersionSpec {
            commands: Some(vec![]),
            ..Default::default()
        };
        let probed = Prober::new().probe(Path::new("/nonexistent"), &spec);
        assert!(!probed.is_resolved());
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(Prober::new().timeout(), Duration::from_secs(30));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
            let path = dir.path().join(name);
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn resolves_version_from_stdout() {
            let temp = TempDir::new().unwrap();
            let exe = script(&temp, "mytool", "echo 'mytool version 1.2.3 (build x)'");

            let probed = Prober::new().probe(&exe, &VersionSpec::default());
            assert_eq!(probed.version(), Some("1.2.3"));
            assert_eq!(probed.path, exe);
        }

        #[test]
        fn resolves_version_from_stderr_and_nonzero_exit() {
            let temp = TempDir::new().unwrap();
            let exe = script(&temp, "legacy", "echo 'legacy v4.5.6' >&2\nexit 1");

            let probed = Prober::new().probe(&exe, &VersionSpec::default());
            assert_eq!(probed.version(), Some("4.5.6"));
        }

        #[test]
        fn falls_through_to_later_candidate() {
            let temp = TempDir::new().unwrap();
            let exe = script(
                &temp,
                "picky",
                "case \"$1\" in\n  version) echo 'picky 2.0.0' ;;\n  *) echo 'unknown flag' >&2; exit 2 ;;\nesac",
            );

            let probed = Prober::new().probe(&exe, &VersionSpec::default());
            assert_eq!(probed.version(), Some("2.0.0"));
        }

        #[test]
        fn uses_configured_commands_in_order() {
            let temp = TempDir::new().unwrap();
            let exe = script(
                &temp,
                "sub",
                "if [ \"$1\" = \"info\" ] && [ \"$2\" = \"--short\" ]; then echo 3.1.4; else echo nothing; fi",
            );
            let spec = VersionSpec {
                commands: Some(vec![
                    vec!["--version".to_string()],
                    vec!["info".to_string(), "--short".to_string()],
                ]),
                ..Default::default()
            };

            let probed = Prober::new().probe(&exe, &spec);
            assert_eq!(probed.version(), Some("3.1.4"));
        }

        #[test]
        fn patterns_take_precedence() {
            let temp = TempDir::new().unwrap();
            let exe = script(&temp, "dated", "echo 'dated 2024.01.15 release 0.8.1'");
            let spec = VersionSpec {
                patterns: vec![r"release (\S+)".to_string()],
                ..Default::default()
            };

            let probed = Prober::new().probe(&exe, &spec);
            assert_eq!(probed.version(), Some("0.8.1"));
        }

        #[test]
        fn unrecognised_output_is_unresolved() {
            let temp = TempDir::new().unwrap();
            let exe = script(&temp, "quiet", "echo 'no version info'");

            let probed = Prober::new().probe(&exe, &VersionSpec::default());
            assert!(!probed.is_resolved());
        }

        #[test]
        fn hanging_executable_returns_within_budget() {
            let temp = TempDir::new().unwrap();
            let exe = script(&temp, "hang", "exec sleep 30");
            let prober = Prober::new().with_timeout(Duration::from_millis(500));

            let start = Instant::now();
            let probed = prober.probe(&exe, &VersionSpec::default());
            let elapsed = start.elapsed();

            assert!(!probed.is_resolved());
            assert!(
                elapsed < Duration::from_secs(3),
                "probe took {:?}",
                elapsed
            );
        }

        #[test]
        fn hanging_grandchild_does_not_stall_probe() {
            let temp = TempDir::new().unwrap();
            // The shell itself is killed, but `sleep` inherits its pipes.
            let exe = script(&temp, "forker", "sleep 30\necho 1.0.0");
            let prober = Prober::new().with_timeout(Duration::from_millis(500));

            let start = Instant::now();
            let probed = prober.probe(&exe, &VersionSpec::default());

            assert!(!probed.is_resolved());
            assert!(start.elapsed() < Duration::from_secs(3));
        }
    }
}
