//! Per-run state of a self-update.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::{Result, ToolupError};
use crate::platform::Os;

/// Everything one self-update run needs, including a scratch directory that
/// is removed when the session is dropped.
#[derive(Debug)]
pub struct SelfUpdateSession {
    /// Version of the running binary.
    pub running_version: String,
    /// `owner/repo` the update comes from.
    pub repo: String,
    /// Path of the running executable.
    pub exe: PathBuf,
    dir: TempDir,
}

impl SelfUpdateSession {
    /// Start a session.
    ///
    /// On platforms that lock running executables the scratch directory is
    /// created beside `exe`, keeping the later renames on one volume.
    pub fn create(running_version: &str, repo: &str, exe: &Path, os: Os) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".toolup-update-");

        let dir = if os.locks_running_executables() {
            let parent = exe.parent().ok_or_else(|| {
                ToolupError::Other(anyhow::anyhow!("{} has no parent directory", exe.display()))
            })?;
            builder.tempdir_in(parent)?
        } else {
            builder.tempdir()?
        };
        debug!("Self-update session directory: {}", dir.path().display());

        Ok(Self {
            running_version: running_version.to_string(),
            repo: repo.to_string(),
            exe: exe.to_path_buf(),
            dir,
        })
    }

    /// The scratch directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_dir_is_removed_on_drop() {
        let session =
            SelfUpdateSession::create("1.0.0", "o/r", Path::new("/usr/bin/toolup"), Os::Linux)
                .unwrap();
        let dir = session.dir().to_path_buf();
        assert!(dir.is_dir());
        drop(session);
        assert!(!dir.exists());
    }

    #[test]
    fn locking_platforms_use_exe_directory() {
        let bin = TempDir::new().unwrap();
        let exe = bin.path().join("toolup.exe");
        let session = SelfUpdateSession::create("1.0.0", "o/r", &exe, Os::Windows).unwrap();
        assert_eq!(session.dir().parent(), Some(bin.path()));
        assert_eq!(session.running_version, "1.0.0");
        assert_eq!(session.repo, "o/r");
    }

    #[test]
    fn other_platforms_use_system_temp() {
        let session =
            SelfUpdateSession::create("1.0.0", "o/r", Path::new("/opt/toolup"), Os::MacOS)
                .unwrap();
        assert!(session.dir().starts_with(std::env::temp_dir()));
    }
}
